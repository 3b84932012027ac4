/// Outcome of replacing the Document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// File name of the backup taken before the overwrite, if one could be made.
    pub backup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub url: String,
}

// remote store writes report the commit instead of a backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub commit: Option<String>,
    pub url: Option<String>,
}
