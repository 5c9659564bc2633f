/// Asks the operator whether an existing file may be replaced.
pub trait OverwritePrompt: Send + Sync {
    /// `filename` already exists in `folder`. Return `true` to overwrite.
    fn confirm_overwrite(&self, filename: &str, folder: &str) -> bool;
}

/// Replaces existing files without asking.
pub struct AlwaysOverwrite;

impl OverwritePrompt for AlwaysOverwrite {
    fn confirm_overwrite(&self, _filename: &str, _folder: &str) -> bool {
        true
    }
}

/// Declines every overwrite, so any collision cancels the save.
pub struct NeverOverwrite;

impl OverwritePrompt for NeverOverwrite {
    fn confirm_overwrite(&self, _filename: &str, _folder: &str) -> bool {
        false
    }
}
