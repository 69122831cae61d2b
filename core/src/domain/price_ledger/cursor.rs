use std::{collections::VecDeque, sync::Arc};

use futures::{Stream, TryStreamExt, stream};
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    price_ledger::{
        entities::PriceHistory, ports::PriceHistoryRepository, value_objects::HistoryRange,
    },
};

/// Restartable view over an ingredient's price history, oldest first.
///
/// Nothing is read until a stream is polled; each call to [`stream`](Self::stream)
/// starts again from the beginning of the range.
pub struct PriceHistoryCursor<PH> {
    repository: Arc<PH>,
    ingredient_id: Uuid,
    range: HistoryRange,
    page_size: usize,
}

struct PageState<PH> {
    repository: Arc<PH>,
    ingredient_id: Uuid,
    range: HistoryRange,
    page_size: usize,
    after_sequence: Option<u64>,
    buffer: VecDeque<PriceHistory>,
    exhausted: bool,
}

impl<PH> Clone for PriceHistoryCursor<PH> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            ingredient_id: self.ingredient_id,
            range: self.range,
            page_size: self.page_size,
        }
    }
}

impl<PH> PriceHistoryCursor<PH>
where
    PH: PriceHistoryRepository + 'static,
{
    pub fn new(
        repository: Arc<PH>,
        ingredient_id: Uuid,
        range: HistoryRange,
        page_size: usize,
    ) -> Self {
        Self {
            repository,
            ingredient_id,
            range,
            page_size: page_size.max(1),
        }
    }

    pub fn ingredient_id(&self) -> Uuid {
        self.ingredient_id
    }

    pub fn range(&self) -> HistoryRange {
        self.range
    }

    pub fn stream(&self) -> impl Stream<Item = Result<PriceHistory, CoreError>> + Send + 'static {
        let state = PageState {
            repository: self.repository.clone(),
            ingredient_id: self.ingredient_id,
            range: self.range,
            page_size: self.page_size,
            after_sequence: None,
            buffer: VecDeque::new(),
            exhausted: false,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if let Some(record) = state.buffer.pop_front() {
                    return Some((Ok(record), state));
                }
                if state.exhausted {
                    return None;
                }

                let page = state
                    .repository
                    .fetch_page(
                        state.ingredient_id,
                        state.range,
                        state.after_sequence,
                        state.page_size,
                    )
                    .await;

                match page {
                    Ok(page) => {
                        state.exhausted = page.len() < state.page_size;
                        match page.last() {
                            Some(last) => state.after_sequence = Some(last.sequence),
                            None => return None,
                        }
                        state.buffer.extend(page);
                    }
                    Err(e) => {
                        state.exhausted = true;
                        return Some((Err(e), state));
                    }
                }
            }
        })
    }

    pub async fn collect(&self) -> Result<Vec<PriceHistory>, CoreError> {
        self.stream().try_collect().await
    }
}
