pub mod init;
pub mod inspect;
pub mod load;
pub mod locator;
pub mod save;
pub mod version;

pub use init::Init;
pub use inspect::Inspect;
pub use load::Load;
pub use locator::Locator;
pub use save::Save;
pub use version::Version;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use common::document::TaskList;
    use common::locator::Locator as AnyLocator;

    use super::*;
    use crate::cli::args::SlotArgs;
    use crate::cli::op::{Op, OpContext};

    async fn init(dir: &Path) -> OpContext {
        let ctx = OpContext::new(Some(dir.to_path_buf()));
        let init = Init {
            seed_hex: Some("000102030405060708090a0b0c0d0e0f".to_string()),
            key_pair_tag: "moduleA".to_string(),
            data_key_tag: "list1".to_string(),
            log_dir: None,
        };
        let output = init.execute(&ctx).await.unwrap();
        assert!(output.contains("Slot: moduleA/list1"));
        ctx
    }

    fn save(items: &[&str], append: bool) -> Save {
        Save {
            items: items.iter().map(|s| s.to_string()).collect(),
            file: None,
            append,
            slot: SlotArgs::default(),
        }
    }

    fn load_json() -> Load {
        Load {
            json: true,
            strict: false,
            slot: SlotArgs::default(),
        }
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = init(&temp.path().join("state")).await;

        // Hydrates to an empty list before the first save
        let json = load_json().execute(&ctx).await.unwrap();
        let list: TaskList = serde_json::from_str(&json).unwrap();
        assert!(list.is_empty());

        let saved_at = save(&["buy milk", "call bank"], false)
            .execute(&ctx)
            .await
            .unwrap();
        assert!(matches!(
            saved_at.parse::<AnyLocator>(),
            Ok(AnyLocator::Resolvable(_))
        ));

        let printed = Locator {
            slot: SlotArgs::default(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(printed, saved_at);

        save(&["water plants"], true).execute(&ctx).await.unwrap();

        let json = load_json().execute(&ctx).await.unwrap();
        let list: TaskList = serde_json::from_str(&json).unwrap();
        let labels: Vec<&str> = list.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["buy milk", "call bank", "water plants"]);

        let inspected = Inspect {
            slot: SlotArgs::default(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert!(inspected.contains("revision: 1"), "{inspected}");
    }

    #[tokio::test]
    async fn test_strict_load_of_unsaved_slot_fails() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = init(&temp.path().join("state")).await;

        let load = Load {
            json: false,
            strict: true,
            slot: SlotArgs {
                key_pair_tag: None,
                data_key_tag: Some("elsewhere".to_string()),
            },
        };
        let err = load.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("no document saved"), "{err}");
    }

    #[tokio::test]
    async fn test_save_from_json_file() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = init(&temp.path().join("state")).await;

        let file = temp.path().join("list.json");
        std::fs::write(
            &file,
            r#"{"items":[{"itemId":"a1","label":"from file","isComplete":true}]}"#,
        )
        .unwrap();

        Save {
            items: vec![],
            file: Some(file),
            append: false,
            slot: SlotArgs::default(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        let json = load_json().execute(&ctx).await.unwrap();
        let list: TaskList = serde_json::from_str(&json).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].item_id, "a1");
        assert!(list.items[0].is_complete);
    }

    #[tokio::test]
    async fn test_ops_require_init() {
        let temp = tempfile::tempdir().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("missing")));

        let err = load_json().execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("not initialized"), "{err}");
    }
}
