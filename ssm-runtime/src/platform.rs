//! Target platform tag.
//!
//! Both the command executor (SSM document selection) and the remote-file
//! collaborator (path and permission semantics) branch on this one type
//! instead of re-checking the raw EC2 platform string.

/// Platform of a target instance, derived from its EC2 description.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Platform {
    /// Linux or any other unix-like AMI (EC2 reports no platform value).
    #[default]
    Unix,
    /// Windows AMI.
    Windows,
}

impl Platform {
    /// SSM document to submit commands with on this platform.
    pub fn document_name(self) -> &'static str {
        match self {
            Platform::Unix => "AWS-RunShellScript",
            Platform::Windows => "AWS-RunPowerShellScript",
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }
}
