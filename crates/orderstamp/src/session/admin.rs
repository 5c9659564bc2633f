//! Settings, routing rules, SKU positions and column mapping management.

use std::path::Path;

use tracing::{info, warn};

use super::service::SessionService;
use crate::bridge::FileBridge;
use crate::broadcast::{SessionEvent, SessionEventKind};
use crate::db::DatabaseError;
use crate::error::{Result, ValidationError};
use crate::ingest::parse_headers;
use crate::models::{AppSettings, ColumnMapping, ProcessingSession, RoutingRule, SkuPosition};
use crate::routing::{validate_rule, RouteResult, Router};
use crate::sanitize::validate_folder_name;
use crate::store::Store;

impl<S: Store, B: FileBridge> SessionService<S, B> {
    pub fn settings(&self) -> Result<AppSettings> {
        Ok(self.store.load_settings()?)
    }

    /// Stores the folder settings. Every non-empty path must exist; the
    /// default sub-folders are then created under the date folder.
    pub async fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        for path in [&settings.date_folder_path, &settings.premade_folder_path] {
            if path.trim().is_empty() {
                continue;
            }
            if !self.bridge.path_exists(Path::new(path)).await? {
                return Err(ValidationError::PathNotFound(path.clone()).into());
            }
        }

        self.store.save_settings(settings)?;

        if !settings.date_folder_path.trim().is_empty() {
            let base = Path::new(&settings.date_folder_path);
            for folder in &self.default_folders {
                validate_folder_name(folder)?;
                self.bridge.create_directory(&base.join(folder), true).await?;
            }
        }

        info!(folders = self.default_folders.len(), "Settings saved");
        self.emit(SessionEvent::new(
            SessionEventKind::SettingsSaved,
            "Settings saved",
        ));
        Ok(())
    }

    pub fn list_rules(&self) -> Result<Vec<RoutingRule>> {
        Ok(self.store.list_rules()?)
    }

    pub fn add_rule(&self, pattern: &str, folder_name: &str, priority: i32) -> Result<RoutingRule> {
        validate_rule(pattern, folder_name)?;
        let rule = RoutingRule::new(pattern.trim(), folder_name.trim(), priority);
        self.store.insert_rule(&rule)?;
        self.warn_on_priority_ties()?;
        Ok(rule)
    }

    /// Replaces the editable fields of a rule; `None` keeps the current value.
    pub fn update_rule(
        &self,
        id: &str,
        pattern: Option<&str>,
        folder_name: Option<&str>,
        priority: Option<i32>,
    ) -> Result<RoutingRule> {
        let mut rule = self.find_rule(id)?;
        if let Some(pattern) = pattern {
            rule.pattern = pattern.trim().to_string();
        }
        if let Some(folder_name) = folder_name {
            rule.folder_name = folder_name.trim().to_string();
        }
        if let Some(priority) = priority {
            rule.priority = priority;
        }
        validate_rule(&rule.pattern, &rule.folder_name)?;

        self.store.update_rule(&rule)?;
        self.warn_on_priority_ties()?;
        Ok(rule)
    }

    pub fn delete_rule(&self, id: &str) -> Result<()> {
        if !self.store.delete_rule(id)? {
            return Err(not_found("Routing rule", id));
        }
        Ok(())
    }

    /// Flips the active flag and returns the new value.
    pub fn toggle_rule(&self, id: &str) -> Result<bool> {
        let rule = self.find_rule(id)?;
        let active = !rule.active;
        self.store.set_rule_active(id, active)?;
        Ok(active)
    }

    /// Where a SKU would be routed with the current active rules.
    pub fn test_routing(&self, sku: &str) -> Result<RouteResult> {
        let router = Router::new(self.store.active_rules()?);
        Ok(router.route(sku))
    }

    fn find_rule(&self, id: &str) -> Result<RoutingRule> {
        self.store
            .find_rule(id)?
            .ok_or_else(|| not_found("Routing rule", id))
    }

    fn warn_on_priority_ties(&self) -> Result<()> {
        let router = Router::new(self.store.active_rules()?);
        for (priority, patterns) in router.duplicate_priorities() {
            warn!(
                priority,
                patterns = %patterns.join(", "),
                "Active rules share a priority; store order decides"
            );
        }
        Ok(())
    }

    pub fn list_positions(&self) -> Result<Vec<SkuPosition>> {
        Ok(self.store.list_positions()?)
    }

    /// Forgets the remembered position of a SKU.
    pub fn forget_position(&self, sku: &str) -> Result<()> {
        let row = self
            .store
            .position_for_sku(sku)?
            .ok_or_else(|| not_found("SKU position", sku))?;
        self.store.delete_position(&row.id)?;
        Ok(())
    }

    pub fn column_mapping(&self) -> Result<Option<ColumnMapping>> {
        Ok(self.store.load_mapping()?)
    }

    pub fn save_column_mapping(&self, mapping: &ColumnMapping) -> Result<()> {
        Ok(self.store.save_mapping(mapping)?)
    }

    pub fn clear_column_mapping(&self) -> Result<()> {
        Ok(self.store.clear_mapping()?)
    }

    /// Header row of a CSV, for building a mapping.
    pub fn preview_headers(&self, csv_text: &str) -> Result<Vec<String>> {
        Ok(parse_headers(csv_text)?)
    }

    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<ProcessingSession>> {
        Ok(self.store.recent_sessions(limit)?)
    }
}

fn not_found(entity: &'static str, id: &str) -> crate::error::OrderstampError {
    DatabaseError::NotFound {
        entity,
        id: id.to_string(),
    }
    .into()
}
