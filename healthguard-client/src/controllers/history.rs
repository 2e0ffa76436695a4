//! Saved assessment records

use super::{acquire, report, AppContext};
use crate::error::Result;
use crate::models::{HistoryRecord, RecordDetail};
use crate::state::BusyFlag;
use parking_lot::Mutex;
use tracing::debug;

pub struct HistoryController {
    ctx: AppContext,
    busy: BusyFlag,
    records: Mutex<Vec<HistoryRecord>>,
    selected: Mutex<Option<RecordDetail>>,
}

impl HistoryController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            busy: BusyFlag::new(),
            records: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
        }
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().clone()
    }

    pub fn selected(&self) -> Option<RecordDetail> {
        self.selected.lock().clone()
    }

    pub async fn load(&self) -> Result<Vec<HistoryRecord>> {
        let records = self
            .ctx
            .api
            .list_records()
            .await
            .map_err(|e| report(self.ctx.notifier.as_ref(), e, "Failed to load records"))?;
        debug!("{} history records", records.len());
        *self.records.lock() = records.clone();
        Ok(records)
    }

    pub async fn view(&self, id: i64) -> Result<RecordDetail> {
        let _busy = acquire(&self.busy)?;
        let detail = self
            .ctx
            .api
            .load_record(id)
            .await
            .map_err(|e| report(self.ctx.notifier.as_ref(), e, "Failed to load the record"))?;
        *self.selected.lock() = Some(detail.clone());
        Ok(detail)
    }

    /// Deletes the record, then reloads the list.
    pub async fn delete(&self, id: i64) -> Result<Vec<HistoryRecord>> {
        {
            let _busy = acquire(&self.busy)?;
            self.ctx
                .api
                .delete_record(id)
                .await
                .map_err(|e| report(self.ctx.notifier.as_ref(), e, "Delete failed"))?;
        }
        self.ctx.notifier.success("Deleted");

        {
            let mut selected = self.selected.lock();
            if selected.as_ref().and_then(|d| d.id) == Some(id) {
                *selected = None;
            }
        }

        self.load().await
    }
}
