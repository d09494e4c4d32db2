use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub struct SpinnerHelper;

impl SpinnerHelper {
  pub fn create(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    let style = ProgressStyle::default_spinner()
      .tick_strings(&[
        "□ □ □ □ □",
        "■ □ □ □ □",
        "□ ■ □ □ □",
        "□ □ ■ □ □",
        "□ □ □ ■ □",
        "□ □ □ □ ■",
        "■ ■ ■ ■ ■",
      ])
      .template("{spinner:.blue} {msg} [{bytes}, {bytes_per_sec}]")
      .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message);
    spinner
  }
}
