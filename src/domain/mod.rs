pub mod entry;
pub mod fingerprint;
pub mod snapshot;

pub use entry::RemoteEntry;
pub use fingerprint::Fingerprint;
pub use snapshot::FeedSnapshot;
