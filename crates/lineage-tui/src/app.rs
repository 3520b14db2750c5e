//! Application state machine and event dispatcher.

use std::{
  collections::HashSet,
  sync::Arc,
};

use bytes::Bytes;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use lineage_client::{AncestryGateway, Generation, HttpGateway, Pipeline};
use lineage_core::{cache::ImageCache, person::AncestorRecord};
use tokio::sync::mpsc::UnboundedSender;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the ancestor list; right pane shows a hint or the selection.
  AncestorList,
  /// Focus on the detail pane for the selected ancestor.
  AncestorDetail,
}

// ─── Row view-state ───────────────────────────────────────────────────────────

/// Portrait slot of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Portrait {
  /// The record has no image link; fixed placeholder, nothing to fetch.
  Unknown,
  /// A fetch is in flight or has failed; placeholder until bytes arrive.
  Pending,
  /// Portrait bytes are resident in the cache.
  Loaded { size: usize },
}

/// Everything the list pane needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowState {
  pub name:     String,
  pub lifespan: String,
  pub portrait: Portrait,
}

/// Result of one background portrait fetch, sent back to the event loop.
pub struct ImageCompletion {
  pub generation: Generation,
  pub href:       String,
  pub result:     lineage_client::Result<Bytes>,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Full ancestor list, replaced atomically on reload.
  pub ancestors: Vec<AncestorRecord>,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* ancestor list.
  pub list_cursor: usize,

  /// Index into `ancestors` of the record shown in the detail pane.
  pub selected: Option<usize>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Portrait cache shared with the fetch tasks.
  pub cache: Arc<ImageCache>,

  /// Image links with a fetch currently in flight.
  pending_fetches: HashSet<String>,

  /// Image links whose fetch failed; the placeholder stays and no retry
  /// is attempted until the next reload.
  failed_fetches: HashSet<String>,

  /// Completion channel back into the event loop.
  completions: UnboundedSender<ImageCompletion>,

  /// Discovery → tree-fetch pipeline over the live gateway.
  pipeline: Pipeline<HttpGateway>,

  /// Root person id and generation depth used for every reload.
  person_id:   String,
  generations: u32,
}

impl App {
  /// Create an [`App`] with an empty ancestor list.
  pub fn new(
    gateway: HttpGateway,
    cache: ImageCache,
    completions: UnboundedSender<ImageCompletion>,
    person_id: String,
    generations: u32,
  ) -> Self {
    Self {
      screen: Screen::AncestorList,
      ancestors: Vec::new(),
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      selected: None,
      status_msg: String::new(),
      cache: Arc::new(cache),
      pending_fetches: HashSet::new(),
      failed_fetches: HashSet::new(),
      completions,
      pipeline: Pipeline::new(gateway),
      person_id,
      generations,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Run the full discovery → tree-fetch pipeline and replace the list.
  ///
  /// Bumping the pipeline generation here is what invalidates portrait
  /// fetches still in flight from the previous list.
  pub async fn reload(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading ancestry…".into();
    match self.pipeline.reload(&self.person_id, self.generations).await {
      Ok((_generation, records)) => {
        self.ancestors = records;
        self.list_cursor = 0;
        self.selected = None;
        self.screen = Screen::AncestorList;
        self.pending_fetches.clear();
        self.failed_fetches.clear();
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e.into())
      }
    }
  }

  // ── Render adapter ────────────────────────────────────────────────────────

  /// Row view-state for one record: name, lifespan, and portrait slot.
  /// Consults the cache only; fetches are started by
  /// [`App::ensure_portraits`].
  pub fn row_state(&self, record: &AncestorRecord) -> RowState {
    let portrait = match &record.image_link_href {
      None => Portrait::Unknown,
      Some(href) => match self.cache.get(href) {
        Some(bytes) => Portrait::Loaded { size: bytes.len() },
        None => Portrait::Pending,
      },
    };
    RowState {
      name: record.display_name.clone(),
      lifespan: record.lifespan.clone(),
      portrait,
    }
  }

  /// Start a background fetch for every filtered row whose portrait is
  /// neither cached, in flight, nor already failed. Called once per frame.
  pub fn ensure_portraits(&mut self) {
    let wanted: Vec<String> = self
      .filtered_records()
      .into_iter()
      .filter_map(|record| record.image_link_href.clone())
      .filter(|href| {
        !self.pending_fetches.contains(href)
          && !self.failed_fetches.contains(href)
          && self.cache.get(href).is_none()
      })
      .collect();
    for href in wanted {
      self.spawn_fetch(href);
    }
  }

  fn spawn_fetch(&mut self, href: String) {
    let generation = self.pipeline.generation();
    let gateway = self.pipeline.gateway().clone();
    let completions = self.completions.clone();
    self.pending_fetches.insert(href.clone());
    tokio::spawn(async move {
      let result = gateway.fetch_image(&href).await;
      // A closed receiver just means the app is shutting down.
      let _ = completions.send(ImageCompletion {
        generation,
        href,
        result,
      });
    });
  }

  /// Apply a finished portrait fetch. Completions tagged with an older
  /// generation are discarded so a stale image never lands on a reused
  /// row. A failed fetch leaves the placeholder for that row only.
  pub fn apply_image_completion(&mut self, done: ImageCompletion) {
    if done.generation != self.pipeline.generation() {
      tracing::debug!(href = %done.href, "discarding stale portrait completion");
      return;
    }
    self.pending_fetches.remove(&done.href);
    match done.result {
      Ok(bytes) => self.cache.put(&done.href, bytes),
      Err(e) => {
        tracing::warn!(href = %done.href, error = %e, "portrait fetch failed");
        self.failed_fetches.insert(done.href);
      }
    }
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Indices into `ancestors` that match the current filter query.
  pub fn filtered_indices(&self) -> Vec<usize> {
    if self.filter.is_empty() {
      return (0..self.ancestors.len()).collect();
    }
    let matcher = SkimMatcherV2::default();
    (0..self.ancestors.len())
      .filter(|&i| {
        matcher
          .fuzzy_match(&self.ancestors[i].display_name, &self.filter)
          .is_some()
      })
      .collect()
  }

  /// Records that match the current filter query, in document order.
  pub fn filtered_records(&self) -> Vec<&AncestorRecord> {
    self
      .filtered_indices()
      .into_iter()
      .map(|i| &self.ancestors[i])
      .collect()
  }

  /// The record under the list cursor in the filtered view, if any.
  pub fn cursor_record(&self) -> Option<&AncestorRecord> {
    let index = *self.filtered_indices().get(self.list_cursor)?;
    self.ancestors.get(index)
  }

  /// The record shown in the detail pane, if any.
  pub fn selected_record(&self) -> Option<&AncestorRecord> {
    self.selected.and_then(|i| self.ancestors.get(i))
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // Filter input mode: all printable keys go into the filter string.
    if self.filter_active {
      return Ok(self.handle_filter_key(key));
    }

    match self.screen {
      Screen::AncestorList => self.handle_list_key(key).await,
      Screen::AncestorDetail => Ok(self.handle_detail_key(key)),
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open detail if there's exactly one match.
        let indices = self.filtered_indices();
        if indices.len() == 1 {
          self.open_detail(indices[0]);
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    true
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_indices().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
        }
      }

      // Open detail
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(&index) = self.filtered_indices().get(self.list_cursor) {
          self.open_detail(index);
        }
      }

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      // Full reload of the tree.
      KeyCode::Char('r') => {
        // A reload failure keeps the old list on screen with the error in
        // the status bar; only startup treats it as fatal.
        let _ = self.reload().await;
      }

      _ => {}
    }
    Ok(true)
  }

  fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Back to list
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::AncestorList;
        self.selected = None;
      }

      // Navigate the list from detail (for quick switching)
      KeyCode::Char(']') | KeyCode::Down | KeyCode::Char('j') => {
        let indices = self.filtered_indices();
        if !indices.is_empty() && self.list_cursor + 1 < indices.len() {
          self.list_cursor += 1;
          self.open_detail(indices[self.list_cursor]);
        }
      }
      KeyCode::Char('[') | KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
          if let Some(&index) = self.filtered_indices().get(self.list_cursor) {
            self.open_detail(index);
          }
        }
      }

      _ => {}
    }
    true
  }

  /// Transition to `AncestorDetail` for the record at `index`.
  fn open_detail(&mut self, index: usize) {
    self.selected = Some(index);
    self.screen = Screen::AncestorDetail;
  }
}

#[cfg(test)]
mod tests {
  use lineage_client::{ClientConfig, Error};
  use lineage_core::cache::CacheConfig;
  use reqwest::StatusCode;
  use tokio::sync::mpsc;

  use super::*;

  fn record(name: &str, href: Option<&str>) -> AncestorRecord {
    AncestorRecord {
      display_name: name.into(),
      lifespan: "1900-1980".into(),
      image_link_href: href.map(Into::into),
    }
  }

  fn app() -> App {
    let gateway = HttpGateway::new(ClientConfig {
      discovery_url: "https://api.test/discovery".into(),
      access_token:  "t0ken".into(),
    })
    .unwrap();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut app = App::new(
      gateway,
      ImageCache::new(CacheConfig::default()),
      tx,
      "KWQS-BBQ".into(),
      4,
    );
    app.ancestors = vec![
      record("Jane Doe", Some("http://img/1")),
      record("John Doe", None),
    ];
    app
  }

  #[test]
  fn row_without_image_link_is_unknown_portrait() {
    let app = app();
    let row = app.row_state(&app.ancestors[1]);
    assert_eq!(row.portrait, Portrait::Unknown);
    assert_eq!(row.name, "John Doe");
  }

  #[test]
  fn row_with_uncached_link_is_pending() {
    let app = app();
    assert_eq!(app.row_state(&app.ancestors[0]).portrait, Portrait::Pending);
  }

  #[test]
  fn fresh_completion_populates_cache_and_row() {
    let mut app = app();
    app.apply_image_completion(ImageCompletion {
      generation: app.pipeline.generation(),
      href:       "http://img/1".into(),
      result:     Ok(Bytes::from_static(b"png")),
    });
    assert_eq!(
      app.row_state(&app.ancestors[0]).portrait,
      Portrait::Loaded { size: 3 }
    );
  }

  #[test]
  fn stale_completion_is_discarded() {
    let mut app = app();
    app.apply_image_completion(ImageCompletion {
      generation: app.pipeline.generation() + 1,
      href:       "http://img/1".into(),
      result:     Ok(Bytes::from_static(b"png")),
    });
    assert!(app.cache.get("http://img/1").is_none());
    assert_eq!(app.row_state(&app.ancestors[0]).portrait, Portrait::Pending);
  }

  #[test]
  fn failed_completion_keeps_placeholder_and_blocks_retry() {
    let mut app = app();
    app.apply_image_completion(ImageCompletion {
      generation: app.pipeline.generation(),
      href:       "http://img/1".into(),
      result:     Err(Error::Status {
        url:    "http://img/1".into(),
        status: StatusCode::NOT_FOUND,
      }),
    });
    assert_eq!(app.row_state(&app.ancestors[0]).portrait, Portrait::Pending);
    assert!(app.failed_fetches.contains("http://img/1"));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn ensure_portraits_spawns_at_most_one_fetch_per_href() {
    let mut app = app();
    app.ensure_portraits();
    app.ensure_portraits();
    assert_eq!(app.pending_fetches.len(), 1);
    assert!(app.pending_fetches.contains("http://img/1"));
  }

  #[test]
  fn filter_narrows_by_display_name() {
    let mut app = app();
    app.filter = "jane".into();
    let filtered = app.filtered_records();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].display_name, "Jane Doe");
  }

  #[test]
  fn cursor_record_follows_filtered_view() {
    let mut app = app();
    app.filter = "john".into();
    app.list_cursor = 0;
    assert_eq!(app.cursor_record().unwrap().display_name, "John Doe");
  }
}
