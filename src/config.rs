//! Configuration for the harness and for the WebSocket transport.
//!
//! [`HarnessConfig`] is built once at startup and handed to the harness by
//! reference; nothing reads process arguments after that.

use std::path::PathBuf;

/// Default co-authoring server endpoint.
pub const DEFAULT_SERVER: &str = "ws://127.0.0.1:8001";

/// Default document every session opens when no base URL is set.
pub const DEFAULT_DOCUMENT_URL: &str = "https://doc.onlyoffice.com/example/samples/sample.docx";

/// Default number of synthetic saves per session.
pub const DEFAULT_CHANGE_BUDGET: u32 = 100;

/// Default directory downloaded `Editor.bin` attachments land in.
pub const DEFAULT_OUTPUT_DIR: &str = "files";

/// Size limits for the client WebSocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Maximum size of a single incoming frame in bytes.
    ///
    /// Default: 16 MB
    pub max_frame_size: usize,

    /// Maximum size of a reassembled incoming message in bytes.
    ///
    /// Default: 64 MB
    pub max_message_size: usize,

    /// Maximum size of the HTTP upgrade response in bytes.
    ///
    /// Default: 8 KB
    pub max_handshake_size: usize,

    /// Read buffer size (in bytes).
    ///
    /// Default: 8 KB
    pub read_buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,
            max_message_size: 64 * 1024 * 1024,
            max_handshake_size: 8192,
            read_buffer_size: 8192,
        }
    }
}

impl TransportConfig {
    /// Validate that an incoming frame is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameTooLarge`](crate::Error::FrameTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_frame_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_frame_size {
            Err(crate::Error::FrameTooLarge {
                size,
                max: self.max_frame_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a reassembled message is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`](crate::Error::MessageTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_message_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_message_size {
            Err(crate::Error::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
        } else {
            Ok(())
        }
    }
}

/// Everything the harness needs to plan and run a load test.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of simulated users.
    ///
    /// Default: 1
    pub users: usize,

    /// Number of documents each user opens.
    ///
    /// Default: 1
    pub documents: usize,

    /// WebSocket endpoint of the co-authoring server.
    pub server: String,

    /// Document URL used when `base_url` is unset.
    pub document_url: String,

    /// When set, each session opens `<base_url>/<name>` picked from `document_names`.
    pub base_url: Option<String>,

    /// Sample document names cycled through when `base_url` is set.
    pub document_names: Vec<String>,

    /// Saves each session submits before asking to close.
    pub change_budget: u32,

    /// Directory for downloaded attachments.
    pub output_dir: PathBuf,

    /// Transport limits shared by every session.
    pub transport: TransportConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            users: 1,
            documents: 1,
            server: DEFAULT_SERVER.to_string(),
            document_url: DEFAULT_DOCUMENT_URL.to_string(),
            base_url: None,
            document_names: vec!["test.docx".to_string()],
            change_budget: DEFAULT_CHANGE_BUDGET,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            transport: TransportConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user and document counts.
    #[must_use]
    pub const fn with_counts(mut self, users: usize, documents: usize) -> Self {
        self.users = users;
        self.documents = documents;
        self
    }

    /// Set the server endpoint.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the document URL used without a base URL.
    #[must_use]
    pub fn with_document_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = url.into();
        self
    }

    /// Set the base URL for cycling through sample documents.
    ///
    /// A trailing slash is stripped.
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.base_url = Some(base.trim_end_matches('/').to_string());
        self
    }

    /// Replace the sample document names.
    #[must_use]
    pub fn with_document_names(mut self, names: Vec<String>) -> Self {
        self.document_names = names;
        self
    }

    /// Set the per-session save budget.
    #[must_use]
    pub const fn with_change_budget(mut self, budget: u32) -> Self {
        self.change_budget = budget;
        self
    }

    /// Set the attachment output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Total number of sessions a run will start.
    #[must_use]
    pub const fn session_count(&self) -> usize {
        self.users * self.documents
    }
}
