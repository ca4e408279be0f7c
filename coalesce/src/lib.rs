//! # cdcr-coalesce
//!
//! Cross-document coreference consistency.
//!
//! A yes/no judgment on one (news, science) mention pair constrains every
//! other judgment sharing one of its mentions. This crate turns a submitted
//! answer plus the annotator's secondary selection into a [`WritePlan`] that
//! keeps all of them consistent, and the [`TaskFetch`] that should follow.
//!
//! # Example
//!
//! ```
//! use cdcr_coalesce::{CoreferencePropagator, TaskFetch};
//! use cdcr_core::{Answer, SecondaryEntitySelection, Task};
//!
//! let task = Task::from_json(r#"{
//!     "id": 1, "hash": "h1",
//!     "news_ent": "cat;4;7", "sci_ent": "Felis catus;0;11",
//!     "news_article_id": 10, "sci_paper_id": 20,
//!     "news_text": "The cat sat.", "sci_text": "Felis catus purrs.",
//!     "news_ents": ["cat;4;7"], "sci_ents": ["Felis catus;0;11"]
//! }"#)?;
//!
//! let plan = CoreferencePropagator::new().plan_submission(
//!     &task,
//!     &SecondaryEntitySelection::seeded(&task),
//!     Answer::Yes,
//!     true,
//! )?;
//! assert_eq!(plan.write.kind(), "single");
//! assert_eq!(plan.refresh, TaskFetch::Next);
//! # Ok::<(), cdcr_core::Error>(())
//! ```

#![warn(missing_docs)]

pub mod propagator;

pub use propagator::{
    BatchItem, BatchWrite, CoreferencePropagator, SingleWrite, SingletonRequest, SubmissionPlan,
    TaskFetch, WriteMethod, WritePlan,
};
