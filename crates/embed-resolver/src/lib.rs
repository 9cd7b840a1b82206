//! Resolves third-party video host embed pages into directly playable stream URLs.
//!
//! The entry point is [`extractor::EmbedExtractor`], usually obtained through
//! [`extractor::default_factory`]:
//!
//! ```rust,no_run
//! # async fn doc() -> Result<(), embed_resolver::extractor::error::ExtractorError> {
//! use embed_resolver::extractor::default_factory;
//!
//! let factory = default_factory()?;
//! let extractor = factory.create_extractor("https://uqload.to/embed-abc123.html")?;
//! let info = extractor.extract().await?;
//! println!("{} ({})", info.url, info.format);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod extractor;
pub mod media;
