//! Output generation for the scraped articles.
//!
//! # Submodules
//!
//! - [`rss`]: Writes one RSS 2.0 document per tag plus a combined feed
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── itcmd.xml                # one per requested tag
//! ├── reforma-tributaria.xml
//! └── feed.xml                 # every tag, deduplicated
//! ```

pub mod rss;
