use crate::interaction::{OverwriteChoice, UserInteraction};
use std::path::Path;
use tracing::{debug, warn};

/// Whether an existing output file gets replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    /// Replace the file
    Yes,
    /// Leave the file alone
    No,
}

/// Sticky overwrite answers for the duration of one walk.
///
/// The two flags are independent. Answering `Always` never clears a
/// previously set `never_overwrite` and vice versa; `always_overwrite`
/// is checked first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverwriteSettings {
    /// Replace every existing file without asking
    pub always_overwrite: bool,
    /// Skip every existing file without asking
    pub never_overwrite: bool,
}

impl OverwriteSettings {
    /// Creates settings with both flags cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            always_overwrite: false,
            never_overwrite: false,
        }
    }

    /// Decides whether `path` may be overwritten, asking `ui` only when no
    /// sticky answer has been given yet.
    ///
    /// A dismissed dialog or a failing one counts as `No`.
    pub fn decide(&mut self, path: &Path, ui: &mut dyn UserInteraction) -> OverwriteDecision {
        if self.always_overwrite {
            return OverwriteDecision::Yes;
        }
        if self.never_overwrite {
            return OverwriteDecision::No;
        }

        let choice = match ui.confirm_overwrite(path) {
            Ok(choice) => choice,
            Err(e) => {
                warn!("Overwrite prompt for {} failed: {}", path.display(), e);
                None
            }
        };
        debug!("Overwrite answer for {}: {:?}", path.display(), choice);

        match choice {
            Some(OverwriteChoice::Yes) => OverwriteDecision::Yes,
            Some(OverwriteChoice::Always) => {
                self.always_overwrite = true;
                OverwriteDecision::Yes
            }
            Some(OverwriteChoice::Never) => {
                self.never_overwrite = true;
                OverwriteDecision::No
            }
            Some(OverwriteChoice::No) | None => OverwriteDecision::No,
        }
    }
}
