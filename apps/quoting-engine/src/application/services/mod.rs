//! Application Services
//!
//! Building blocks the processors compose: reference-data caching, duplicate
//! detection, transactional writes, recipient resolution, signing and
//! callback delivery.

mod callback_dispatcher;
mod duplicate_detector;
mod enum_cache;
mod message_signer;
mod recipient_resolver;
mod record_writer;

pub use callback_dispatcher::{CallbackDispatcher, CallbackPath, OutboundMessage, callback_url};
pub use duplicate_detector::DuplicateDetector;
pub use enum_cache::{CacheKey, CachedReferenceData, EnumCache};
pub use message_signer::MessageSigner;
pub use recipient_resolver::{ParticipantLocation, RecipientResolver, ResolvedRecipient};
pub use record_writer::{PendingWrite, RecordWriter, WriteOutcome};
