/// Lightweight test harness for multi-process persistence tests
///
/// This module provides a simple way to run several "processes" against one
/// in-process storage network (a shared blob store plus registry), without
/// requiring external infrastructure.
///
/// # Example
///
/// ```rust,ignore
/// use common::document::TaskList;
/// use common::testkit::TestNetwork;
///
/// #[tokio::test]
/// async fn test_restart() -> anyhow::Result<()> {
///     let net = TestNetwork::new().await?;
///
///     // A process saves under its seed
///     let alice = net.spawn_process("alice")?;
///     alice.save(&TaskList::default(), "moduleA", "list1").await?;
///
///     // A fresh process with the same seed sees the document
///     let restarted = net.restart(&alice);
///     let list = restarted.load("moduleA", "list1").await?;
///     assert!(list.is_empty());
///     Ok(())
/// }
/// ```
mod gated;
mod network;
mod process;

pub use gated::GatedRegistry;
pub use network::TestNetwork;
pub use process::{TestPersister, TestProcess};
