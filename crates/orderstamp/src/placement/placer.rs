use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use super::filename::generate_filename;
use super::prompt::OverwritePrompt;
use crate::bridge::FileBridge;
use crate::error::PlacementError;
use crate::models::{OrderItem, OrderStatus, RoutingRule};
use crate::routing::resolve_folder;
use crate::sanitize::validate_folder_name;
use crate::stamp;
use crate::store::OrderStore;
use crate::tabs::{AttachedFile, StampPosition, UploadTab};

/// What a successful save did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    /// Routing target the files went into.
    pub folder_name: String,
    pub target_dir: PathBuf,
    /// Written files in tab order.
    pub saved_paths: Vec<PathBuf>,
    /// File names that replaced existing files.
    pub overwritten: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

struct StampedTab {
    label: String,
    bytes: Vec<u8>,
}

/// Stamps an order's tabs and writes them into the routed folder.
pub struct FilePlacer<'a, B: FileBridge + ?Sized, S: OrderStore + ?Sized> {
    bridge: &'a B,
    orders: &'a S,
}

impl<'a, B: FileBridge + ?Sized, S: OrderStore + ?Sized> FilePlacer<'a, B, S> {
    pub fn new(bridge: &'a B, orders: &'a S) -> Self {
        Self { bridge, orders }
    }

    /// Saves every tab of `order` under `base_folder/<routed folder>`.
    ///
    /// Nothing touches the bridge until all tabs have a file and a position,
    /// the base folder is set, a rule matches and every tab stamped cleanly.
    /// All collisions are confirmed before the first write; one decline
    /// cancels the whole order. A failed write stops the loop and leaves the
    /// order unsaved.
    pub async fn place_files(
        &self,
        order: &OrderItem,
        tabs: &[UploadTab],
        base_folder: &str,
        rules: &[RoutingRule],
        prompt: &dyn OverwritePrompt,
    ) -> Result<PlacementReport, PlacementError> {
        let span = info_span!(
            "placement.save",
            order = %order.external_id,
            sku = %order.sku,
            tabs = tabs.len()
        );
        self.place_inner(order, tabs, base_folder, rules, prompt)
            .instrument(span)
            .await
    }

    async fn place_inner(
        &self,
        order: &OrderItem,
        tabs: &[UploadTab],
        base_folder: &str,
        rules: &[RoutingRule],
        prompt: &dyn OverwritePrompt,
    ) -> Result<PlacementReport, PlacementError> {
        let ready = ready_tabs(tabs)?;

        if base_folder.trim().is_empty() {
            return Err(PlacementError::BaseFolderNotConfigured);
        }

        let folder_name = resolve_folder(&order.sku, rules)
            .ok_or_else(|| PlacementError::NoRoute {
                sku: order.sku.clone(),
            })?
            .to_string();
        validate_folder_name(&folder_name)?;

        let mut stamped = Vec::with_capacity(ready.len());
        for (tab, file, position) in &ready {
            let bytes = stamp::stamp(&file.bytes, &order.order_number, position).map_err(
                |source| PlacementError::Stamp {
                    label: tab.label.clone(),
                    source,
                },
            )?;
            stamped.push(StampedTab {
                label: tab.label.clone(),
                bytes,
            });
        }
        debug!(count = stamped.len(), "Stamped all tabs");

        let target_dir = Path::new(base_folder).join(&folder_name);
        self.ensure_directory(&target_dir).await?;

        let targets: Vec<(String, PathBuf)> = stamped
            .iter()
            .map(|tab| {
                let filename = generate_filename(&order.external_id, &tab.label, &order.sku);
                let path = target_dir.join(&filename);
                (filename, path)
            })
            .collect();

        let mut overwritten = Vec::new();
        for (filename, path) in &targets {
            let check = self
                .bridge
                .file_exists(path)
                .await
                .map_err(|source| PlacementError::WriteFile {
                    path: path.clone(),
                    source,
                })?;
            if !check.exists {
                continue;
            }
            if !prompt.confirm_overwrite(filename, &folder_name) {
                info!(file = %filename, "Overwrite declined, save cancelled");
                return Err(PlacementError::Cancelled {
                    filename: filename.clone(),
                    folder: folder_name,
                });
            }
            overwritten.push(filename.clone());
        }

        let mut saved_paths = Vec::with_capacity(targets.len());
        for ((filename, path), tab) in targets.iter().zip(&stamped) {
            if let Err(source) = self.bridge.write_file(path, &tab.bytes).await {
                warn!(
                    file = %filename,
                    written = saved_paths.len(),
                    error = %source,
                    "Write failed, order left unsaved"
                );
                return Err(PlacementError::WriteFile {
                    path: path.clone(),
                    source,
                });
            }
            saved_paths.push(path.clone());
        }

        let saved_at = Utc::now();
        self.orders
            .set_order_status(&order.id, OrderStatus::Saved, Some(saved_at))?;

        info!(
            folder = %folder_name,
            files = saved_paths.len(),
            overwritten = overwritten.len(),
            "Order saved"
        );

        Ok(PlacementReport {
            folder_name,
            target_dir,
            saved_paths,
            overwritten,
            saved_at,
        })
    }

    async fn ensure_directory(&self, dir: &Path) -> Result<(), PlacementError> {
        let to_error = |source| PlacementError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        };
        if self.bridge.path_exists(dir).await.map_err(to_error)? {
            return Ok(());
        }
        self.bridge
            .create_directory(dir, true)
            .await
            .map_err(to_error)
    }
}

/// Every tab with its file and position, or the list of what is missing.
fn ready_tabs(
    tabs: &[UploadTab],
) -> Result<Vec<(&UploadTab, &AttachedFile, &StampPosition)>, PlacementError> {
    if tabs.is_empty() {
        return Err(PlacementError::IncompleteTabs {
            reasons: vec!["Order has no tabs".to_string()],
        });
    }

    let mut ready = Vec::with_capacity(tabs.len());
    let mut reasons = Vec::new();
    for tab in tabs {
        match (&tab.file, &tab.position) {
            (Some(file), Some(position)) => ready.push((tab, file, position)),
            (None, Some(_)) => reasons.push(format!("Tab {} is missing PDF file", tab.label)),
            (Some(_), None) => reasons.push(format!(
                "Tab {} is missing order number placement",
                tab.label
            )),
            (None, None) => reasons.push(format!(
                "Tab {} is missing PDF file and order number placement",
                tab.label
            )),
        }
    }

    if reasons.is_empty() {
        Ok(ready)
    } else {
        Err(PlacementError::IncompleteTabs { reasons })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use lopdf::{dictionary, Document, Object, Stream};

    use super::*;
    use crate::bridge::testing::MemoryBridge;
    use crate::db::DatabaseError;
    use crate::placement::{AlwaysOverwrite, NeverOverwrite};
    use crate::tabs::compute_tabs;

    /// Records status updates instead of persisting them.
    #[derive(Default)]
    struct RecordingOrders {
        updates: Mutex<Vec<(String, OrderStatus)>>,
    }

    impl OrderStore for RecordingOrders {
        fn insert_orders(&self, _items: &[OrderItem]) -> Result<(), DatabaseError> {
            Ok(())
        }
        fn find_order(&self, _id: &str) -> Result<Option<OrderItem>, DatabaseError> {
            Ok(None)
        }
        fn orders_for_session(&self, _session_id: &str) -> Result<Vec<OrderItem>, DatabaseError> {
            Ok(vec![])
        }
        fn set_order_status(
            &self,
            id: &str,
            status: OrderStatus,
            _saved_at: Option<DateTime<Utc>>,
        ) -> Result<(), DatabaseError> {
            self.updates.lock().unwrap().push((id.to_string(), status));
            Ok(())
        }
        fn count_orders_with_status(
            &self,
            _session_id: &str,
            _status: OrderStatus,
        ) -> Result<u32, DatabaseError> {
            Ok(0)
        }
    }

    fn one_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 400.into(), 800.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn order(sku: &str) -> OrderItem {
        let now = Utc::now();
        OrderItem {
            id: "order-1".to_string(),
            session_id: "s".to_string(),
            external_id: "123".to_string(),
            order_number: "#1001".to_string(),
            sku: sku.to_string(),
            product_title: "Mug".to_string(),
            quantity: 1,
            number_of_lines: 1,
            customer_note: String::new(),
            additional_options: String::new(),
            is_customized: false,
            status: OrderStatus::Uploaded,
            saved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn filled_tabs(sku: &str, quantity: i64) -> Vec<UploadTab> {
        let pdf = one_page_pdf();
        let mut tabs = compute_tabs(sku, quantity, 1);
        for tab in &mut tabs {
            tab.file = Some(AttachedFile {
                name: "design.pdf".to_string(),
                bytes: pdf.clone(),
            });
            tab.position = Some(StampPosition::new(10.0, 20.0, 12.0));
            tab.placed = true;
        }
        tabs
    }

    fn rules() -> Vec<RoutingRule> {
        vec![
            RoutingRule::new("CH", "Mugs", 0),
            RoutingRule::new("CD", "Cards", 1),
        ]
    }

    #[tokio::test]
    async fn test_missing_position_makes_no_bridge_calls() {
        let bridge = MemoryBridge::new();
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let mut tabs = filled_tabs("CH-1", 2);
        tabs[1].position = None;
        tabs[1].placed = false;

        let err = placer
            .place_files(&order("CH-1"), &tabs, "/base", &rules(), &AlwaysOverwrite)
            .await
            .unwrap_err();
        match err {
            PlacementError::IncompleteTabs { reasons } => {
                assert_eq!(reasons, vec!["Tab 2 is missing order number placement"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bridge.call_count(), 0);
        assert!(orders.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_base_folder() {
        let bridge = MemoryBridge::new();
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let err = placer
            .place_files(
                &order("CH-1"),
                &filled_tabs("CH-1", 1),
                "  ",
                &rules(),
                &AlwaysOverwrite,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::BaseFolderNotConfigured));
        assert_eq!(bridge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_route() {
        let bridge = MemoryBridge::new();
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let err = placer
            .place_files(
                &order("BL-9"),
                &filled_tabs("BL-9", 1),
                "/base",
                &rules(),
                &AlwaysOverwrite,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No routing rule found for SKU: BL-9");
        assert_eq!(bridge.call_count(), 0);
    }

    #[tokio::test]
    async fn test_two_sided_writes_front_and_inside() {
        let bridge = MemoryBridge::new();
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let report = placer
            .place_files(
                &order("CD-5"),
                &filled_tabs("CD-5", 3),
                "/base",
                &rules(),
                &AlwaysOverwrite,
            )
            .await
            .unwrap();

        assert_eq!(report.folder_name, "Cards");
        assert_eq!(
            report.saved_paths,
            vec![
                PathBuf::from("/base/Cards/123-Front.pdf"),
                PathBuf::from("/base/Cards/123-Inside.pdf"),
            ]
        );
        assert!(bridge.dirs.lock().unwrap().contains(Path::new("/base/Cards")));
        let written = bridge.file("/base/Cards/123-Front.pdf").unwrap();
        assert!(written.starts_with(b"%PDF"));
        assert_eq!(
            *orders.updates.lock().unwrap(),
            vec![("order-1".to_string(), OrderStatus::Saved)]
        );
    }

    #[tokio::test]
    async fn test_declined_overwrite_writes_nothing() {
        let bridge = MemoryBridge::new()
            .with_dir("/base/Mugs")
            .with_file("/base/Mugs/123-2.pdf", b"old");
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let err = placer
            .place_files(
                &order("CH-1"),
                &filled_tabs("CH-1", 2),
                "/base",
                &rules(),
                &NeverOverwrite,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PlacementError::Cancelled { ref filename, .. } if filename == "123-2.pdf"));
        assert!(bridge.file("/base/Mugs/123.pdf").is_none());
        assert_eq!(bridge.file("/base/Mugs/123-2.pdf").unwrap(), b"old");
        assert!(orders.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_overwrite_is_reported() {
        let bridge = MemoryBridge::new()
            .with_dir("/base/Mugs")
            .with_file("/base/Mugs/123.pdf", b"old");
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let report = placer
            .place_files(
                &order("CH-1"),
                &filled_tabs("CH-1", 1),
                "/base",
                &rules(),
                &AlwaysOverwrite,
            )
            .await
            .unwrap();
        assert_eq!(report.overwritten, vec!["123.pdf"]);
        assert_ne!(bridge.file("/base/Mugs/123.pdf").unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_bridge_message() {
        let bridge = MemoryBridge::new();
        bridge.failing_writes.lock().unwrap().insert(
            PathBuf::from("/base/Mugs/123-2.pdf"),
            "EACCES: permission denied".to_string(),
        );
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let err = placer
            .place_files(
                &order("CH-1"),
                &filled_tabs("CH-1", 3),
                "/base",
                &rules(),
                &AlwaysOverwrite,
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("EACCES: permission denied"));
        // Earlier files stay, later ones are never attempted.
        assert!(bridge.file("/base/Mugs/123.pdf").is_some());
        assert!(bridge.file("/base/Mugs/123-3.pdf").is_none());
        assert!(orders.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_pdf_aborts_before_any_write() {
        let bridge = MemoryBridge::new();
        let orders = RecordingOrders::default();
        let placer = FilePlacer::new(&bridge, &orders);

        let mut tabs = filled_tabs("CH-1", 2);
        tabs[1].file = Some(AttachedFile {
            name: "broken.pdf".to_string(),
            bytes: b"%PDF-garbage".to_vec(),
        });

        let err = placer
            .place_files(&order("CH-1"), &tabs, "/base", &rules(), &AlwaysOverwrite)
            .await
            .unwrap_err();
        assert!(matches!(err, PlacementError::Stamp { ref label, .. } if label == "2"));
        assert_eq!(bridge.call_count(), 0);
    }

    #[test]
    fn test_ready_tabs_lists_every_problem() {
        let tabs = vec![UploadTab::empty(0, "1"), {
            let mut t = UploadTab::empty(1, "2");
            t.position = Some(StampPosition::new(0.0, 0.0, 12.0));
            t
        }];
        match ready_tabs(&tabs) {
            Err(PlacementError::IncompleteTabs { reasons }) => assert_eq!(
                reasons,
                vec![
                    "Tab 1 is missing PDF file and order number placement",
                    "Tab 2 is missing PDF file",
                ]
            ),
            _ => panic!("expected incomplete tabs"),
        }
    }
}
