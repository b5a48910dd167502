//! Liftoff Core Library
//!
//! Installs, updates and launches apps described by small JSON descriptors
//! pointing to a remote distribution point.

pub mod app;
pub mod archive;
pub mod descriptor;
pub mod error;
pub mod lock;
pub mod net;
pub mod resolver;
pub mod run;
pub mod session;
pub mod settings;
pub mod shortcut;
pub mod ui;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Descriptors
    pub use crate::descriptor::{
        AppDescriptor, DEFAULT_DESCRIPTOR_FILE_NAME, DescriptorContext, PackageVersion,
        PackageVersions,
    };

    // Apps
    pub use crate::app::{App, AppGallery, UpdatePlan};

    // Running
    pub use crate::run::RunOrchestrator;
    pub use crate::session::{LoopHandle, run_with_event_loop};
    pub use crate::ui::UserInterface;

    // Collaborators
    pub use crate::archive::{Extractor, ZipExtractor};
    pub use crate::net::{HttpRetriever, Retriever};
    pub use crate::resolver::UrlResolver;
    pub use crate::shortcut::{DesktopShortcutCreator, ShortcutCreator};

    // Settings and errors
    pub use crate::error::LaunchError;
    pub use crate::settings::{Settings, SettingsStore};
    pub use crate::version::Version;
}
