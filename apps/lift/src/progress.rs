use airlift_upload::{BatchSummary, UploadEvent};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

/// Batches smaller than this finish too fast for a bar to be useful.
pub const BAR_THRESHOLD: u64 = 512 * 1024;

/// Resolution of the bar: fractions are mapped onto `0..=BAR_LENGTH`.
const BAR_LENGTH: u64 = 1000;

/// Renders upload events on stderr.
pub struct ProgressView {
    bar: ProgressBar,
}

impl ProgressView {
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(BAR_LENGTH);
            if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}")
            {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn apply(&self, event: &UploadEvent) {
        match event {
            UploadEvent::Started {
                files, total_bytes, ..
            } => {
                self.bar
                    .set_message(format!("{files} file(s), {}", HumanBytes(*total_bytes)));
            }
            UploadEvent::Progress { fraction, .. } => {
                let pos = (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64;
                self.bar.set_position(pos);
            }
            UploadEvent::FileCompleted { name, .. } => {
                self.bar.set_message(format!("uploaded {name}"));
            }
            UploadEvent::Finished { summary, .. } => match summary {
                BatchSummary::Completed { .. } => self.bar.finish_and_clear(),
                BatchSummary::Failed { .. }
                | BatchSummary::AuthRequired
                | BatchSummary::Cancelled => self.bar.abandon(),
            },
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message().to_string()
    }
}

/// Applies events until every sender is gone.
pub async fn render(mut events: mpsc::UnboundedReceiver<UploadEvent>, visible: bool) {
    let view = ProgressView::new(visible);
    while let Some(event) = events.recv().await {
        view.apply(&event);
    }
}
