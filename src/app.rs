//! Model wiring for a host application.
//!
//! Opens the tab/history database, restores the persisted tabs into a
//! [`TabModel`] whose id counter continues after the largest stored id, and
//! loads the settings.

use std::cell::RefCell;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::database::db_manager::DbManager;
use crate::database::gateway::PersistenceGateway;
use crate::models::history_model::HistoryModel;
use crate::models::notifier::SubscriptionId;
use crate::models::tab_model::TabModel;
use crate::platform;
use crate::services::setting_manager::{EngineChannel, SettingManager, SettingManagerTrait};
use crate::types::errors::SettingsError;

pub struct BrowserModels {
    pub db: Rc<DbManager>,
    pub tab_model: TabModel,
    pub setting_manager: SettingManager,
}

/// A history model fed by database events for as long as the handle lives.
pub struct HistoryModelHandle {
    model: Rc<RefCell<HistoryModel>>,
    db: Rc<DbManager>,
    subscription: SubscriptionId,
}

impl HistoryModelHandle {
    pub fn model(&self) -> &Rc<RefCell<HistoryModel>> {
        &self.model
    }
}

impl Deref for HistoryModelHandle {
    type Target = RefCell<HistoryModel>;

    fn deref(&self) -> &Self::Target {
        &self.model
    }
}

impl Drop for HistoryModelHandle {
    fn drop(&mut self) {
        self.db.unsubscribe(self.subscription);
    }
}

impl BrowserModels {
    /// Opens the models on the database at `db_path`. Settings use
    /// `settings_path`, or the platform config path when `None`.
    pub fn open<P: AsRef<Path>>(db_path: P, settings_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let db = DbManager::open(db_path)?;
        Self::with_database(db, settings_path)
    }

    /// Opens the models at the platform data and config paths.
    pub fn open_default() -> Result<Self, Box<dyn std::error::Error>> {
        fs::create_dir_all(platform::get_data_dir())?;
        let db = DbManager::open(platform::get_database_path())?;
        Self::with_database(db, None)
    }

    pub fn open_in_memory(settings_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_database(DbManager::open_in_memory()?, settings_path)
    }

    fn with_database(db: DbManager, settings_path: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Rc::new(db);
        let gateway: Rc<dyn PersistenceGateway> = db.clone();

        let mut tab_model = TabModel::new(db.max_tab_id()? + 1, gateway);
        let tabs = db.all_tabs()?;
        log::debug!("restoring {} tabs", tabs.len());
        tab_model.tabs_available(tabs, 0);

        let settings_path = settings_path.map(|p| p.to_string_lossy().into_owned());
        let mut setting_manager = SettingManager::new(settings_path);
        setting_manager.load()?;

        Ok(Self {
            db,
            tab_model,
            setting_manager,
        })
    }

    /// Builds a history model on the same database, kept current by its
    /// events until the returned handle is dropped.
    pub fn history_model(&self) -> HistoryModelHandle {
        let model = Rc::new(RefCell::new(HistoryModel::new(self.db.clone())));
        let weak = Rc::downgrade(&model);
        let subscription = self.db.subscribe(move |event| {
            if let Some(model) = weak.upgrade() {
                // A busy model caused this event itself and is already up to date.
                if let Ok(mut model) = model.try_borrow_mut() {
                    model.handle_db_event(event);
                }
            }
        });
        HistoryModelHandle {
            model,
            db: self.db.clone(),
            subscription,
        }
    }

    /// Applies deferred settings work. Clearing history also closes every tab.
    pub fn startup(&mut self, engine: &dyn EngineChannel) -> Result<(), SettingsError> {
        if self.setting_manager.initialize(self.db.as_ref(), engine)? {
            self.tab_model.clear();
        }
        Ok(())
    }
}
