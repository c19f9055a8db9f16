//! Service layer for Syndicate
//!
//! [`SyndicateService`] is the single entry point the binaries use. It owns
//! the shared database handle and hands out the specialized services:
//!
//! - `PostService`: create, read and delete posts
//! - `PublishingService`: publish to one or all platforms, unpublish
//! - `CredentialStore`: manage encrypted platform credentials
//! - `EventBus`: publish progress events
//!
//! # Example
//!
//! ```no_run
//! use libsyndicate::service::SyndicateService;
//! use libsyndicate::{Codec, NewPost};
//!
//! # async fn example() -> libsyndicate::Result<()> {
//! let service = SyndicateService::new(Codec::from_env()?).await?;
//!
//! let post = service.posts().create(NewPost::new("Hi", "World")).await?;
//! let response = service.publishing().publish_all(&post.id).await?;
//! println!("Published to {}", response.successes.join(", "));
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod posts;
pub mod publishing;

use self::events::{EventBus, EventReceiver};
use self::posts::PostService;
use self::publishing::PublishingService;
use crate::credentials::CredentialStore;
use crate::platforms::PublisherRegistry;
use crate::{Codec, Config, Database, Result};

#[derive(Clone)]
pub struct SyndicateService {
    db: Database,
    posts: PostService,
    publishing: PublishingService,
    credentials: CredentialStore,
    event_bus: EventBus,
}

impl SyndicateService {
    /// Create a service from the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or the database
    /// cannot be opened and migrated.
    pub async fn new(codec: Codec) -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(&config, codec).await
    }

    /// Create a service with the real HTTP publishers
    pub async fn from_config(config: &Config, codec: Codec) -> Result<Self> {
        let publishers = PublisherRegistry::http(&config.platforms, codec.clone())?;
        Self::with_publishers(config, codec, publishers).await
    }

    /// Create a service with explicit publishers
    ///
    /// Tests use this to swap in mock or locally served platforms.
    pub async fn with_publishers(
        config: &Config,
        codec: Codec,
        publishers: PublisherRegistry,
    ) -> Result<Self> {
        let db = Database::new(&config.database_path()).await?;
        let event_bus = EventBus::new(100);
        let credentials = CredentialStore::new(db.clone(), codec);

        let publishing = PublishingService::new(
            db.clone(),
            credentials.clone(),
            publishers,
            event_bus.clone(),
            config.publishing.timeout(),
        );
        let posts = PostService::new(db.clone());

        Ok(Self {
            db,
            posts,
            publishing,
            credentials,
            event_bus,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    pub fn publishing(&self) -> &PublishingService {
        &self.publishing
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Subscribe to publish progress events
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}
