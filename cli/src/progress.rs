use std::io::{self, Write};

use content_engine::{
    PipelineOutput,
    pipeline::{PipelineState, Progress},
    stages::Stage,
};
use log::warn;

/// Echoes a run to the terminal: a header per stage, then the model's text
/// as it streams in.
pub struct ProgressPrinter<W> {
    out: W,
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn observe(&mut self, progress: Progress<'_>) {
        if let Err(e) = self.write(progress) {
            warn!("Couldn't print progress: {e}");
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, progress: Progress<'_>) -> io::Result<()> {
        match progress {
            Progress::StateChanged(PipelineState::Running(stage)) => {
                writeln!(self.out, "\n=== {stage} ===")?;
            }
            Progress::StateChanged(PipelineState::Failed(stage)) => {
                writeln!(self.out, "\n=== {stage} failed ===")?;
            }
            Progress::StateChanged(_) => {}
            Progress::TextDelta(delta) => write!(self.out, "{delta}")?,
            Progress::StageFinished {
                stage: Stage::Creator,
                output,
            } => writeln!(self.out, "\nImage: {output}")?,
            Progress::StageFinished { .. } => writeln!(self.out)?,
        }
        self.out.flush()
    }
}

pub fn print_summary(out: &mut impl Write, output: &PipelineOutput) -> io::Result<()> {
    writeln!(out, "\n=== Result ===")?;
    writeln!(out, "Request:     {}", output.request)?;
    writeln!(out, "Key message: {}", output.key_message)?;
    match &output.assembled.image_path {
        Some(path) => writeln!(out, "Saved image: {}", path.display())?,
        None => writeln!(out, "Image:       {}", output.creator.image_reference)?,
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn prints_headers_and_streamed_text() {
        let mut printer = ProgressPrinter::new(Vec::new());
        for progress in [
            Progress::StateChanged(PipelineState::Running(Stage::Clarity)),
            Progress::TextDelta("A clear "),
            Progress::TextDelta("brief."),
            Progress::StageFinished {
                stage: Stage::Clarity,
                output: "A clear brief.",
            },
            Progress::StateChanged(PipelineState::Running(Stage::Creator)),
            Progress::TextDelta("Blue antibody"),
            Progress::StageFinished {
                stage: Stage::Creator,
                output: "https://img.example/a.png",
            },
            Progress::StateChanged(PipelineState::Running(Stage::Copywriter)),
            Progress::StateChanged(PipelineState::Failed(Stage::Copywriter)),
        ] {
            printer.observe(progress);
        }

        let printed = String::from_utf8(printer.into_inner()).unwrap();
        expect![[r#"

            === Clarity ===
            A clear brief.

            === Creator ===
            Blue antibody
            Image: https://img.example/a.png

            === Copywriter ===

            === Copywriter failed ===
        "#]]
        .assert_eq(&printed);
    }
}
