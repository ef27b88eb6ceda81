pub mod export_metadata;
pub mod organize;
pub mod preview;
pub mod publish;
pub mod reorganize;
pub mod scan;
pub mod verify;
