//! AFP (MO:DCA) document output.
//!
//! A [`Renderer`] owns the output stream. Pages are numbered in the order they
//! are started or prepared, drawn independently, and written strictly in that
//! order no matter when each one finishes.

mod field;
mod image;
mod page;
mod ptoca;
pub mod records;
mod triplet;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub use field::{
    CARRIAGE_CONTROL, Category, INTRODUCER_LEN, MAX_FIELD_LENGTH, SF_CLASS, SfType,
    StructuredField,
};
pub use image::MAX_IMAGE_CHUNK;
pub use page::{
    DeferredPage, FontAttributes, FontRegistry, MAX_FONT_REFERENCE, Page, PageContext, PageState,
};
pub use ptoca::MAX_TRANSPARENT_DATA;
pub use records::{TextPlacement, UNITS_PER_TEN_INCHES};
pub use triplet::{
    FqnType, MAX_TRIPLET_PAYLOAD, ObjectClass, ObjectType, TRIPLET_HEADER_LEN, Triplet,
};

use crate::config::RendererOptions;
use crate::error::Error;
use crate::fonts::FontService;
use crate::model::PageViewport;

const DOCUMENT_NAME: &str = "DOC00001";

static NEXT_RENDERER_ID: AtomicU64 = AtomicU64::new(1);

pub struct Renderer<W: Write> {
    /// Stamped on every page this renderer starts.
    id: u64,
    out: W,
    options: RendererOptions,
    fonts: Arc<dyn FontService>,
    next_sequence: usize,
    next_to_write: usize,
    /// Pages started or prepared and not yet finished or aborted.
    open: BTreeSet<usize>,
    /// Finished pages waiting for an earlier page.
    finished: BTreeMap<usize, Vec<u8>>,
    aborted: BTreeSet<usize>,
    pages_written: usize,
    bytes_written: usize,
    started: Instant,
}

impl<W: Write> Renderer<W> {
    /// Opens a document on `out`.
    pub fn new(
        mut out: W,
        options: RendererOptions,
        fonts: Arc<dyn FontService>,
    ) -> Result<Self, Error> {
        let header = records::begin_document(DOCUMENT_NAME).serialize()?;
        out.write_all(&header)?;
        log::debug!("begin document {DOCUMENT_NAME} ({options:?})");
        Ok(Self {
            id: NEXT_RENDERER_ID.fetch_add(1, Ordering::Relaxed),
            out,
            options,
            fonts,
            next_sequence: 0,
            next_to_write: 0,
            open: BTreeSet::new(),
            finished: BTreeMap::new(),
            aborted: BTreeSet::new(),
            pages_written: 0,
            bytes_written: header.len(),
            started: Instant::now(),
        })
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Starts the next page in document order.
    pub fn start_page(&mut self, viewport: &PageViewport) -> Result<Page, Error> {
        let sequence = self.next_sequence;
        let page = Page::begin(
            self.id,
            sequence,
            viewport,
            self.options,
            Arc::clone(&self.fonts),
        )?;
        self.next_sequence += 1;
        self.open.insert(sequence);
        Ok(page)
    }

    /// Starts the next page in document order and suspends it right after its
    /// header, reserving its position in the output.
    pub fn prepare_page(&mut self, viewport: &PageViewport) -> Result<DeferredPage, Error> {
        Ok(self.start_page(viewport)?.defer())
    }

    /// Finalizes a page and writes every page that is now ready in order.
    pub fn finish_page(&mut self, page: Page) -> Result<(), Error> {
        let sequence = page.sequence();
        if page.owner() != self.id {
            return Err(Error::ForeignPage { sequence });
        }
        if !self.open.remove(&sequence) {
            return Err(Error::InvalidPageState {
                expected: PageState::Preparing,
                actual: PageState::Finalized,
            });
        }
        match page.finish() {
            Ok(bytes) => {
                self.finished.insert(sequence, bytes);
                self.flush_ready()
            }
            Err(e) => {
                log::warn!("page {} failed to finish: {e}", sequence + 1);
                self.aborted.insert(sequence);
                self.flush_ready()?;
                Err(e)
            }
        }
    }

    /// Drops a page without writing any of it. Later pages are not held back.
    /// Pages started by another renderer are ignored.
    pub fn abort_page(&mut self, page: Page) {
        let sequence = page.sequence();
        if page.owner() != self.id {
            log::warn!("ignoring abort of page {} from another renderer", sequence + 1);
            return;
        }
        if self.open.remove(&sequence) {
            log::warn!("aborting page {} ({})", sequence + 1, page.name());
            self.aborted.insert(sequence);
            if let Err(e) = self.flush_ready() {
                log::warn!("failed to write pages after abort: {e}");
            }
        }
    }

    /// Renders a page start to finish, or continues `deferred` when given. A
    /// failure inside `draw` aborts the page and is returned.
    pub fn render_page<F>(
        &mut self,
        viewport: &PageViewport,
        deferred: Option<DeferredPage>,
        draw: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut Page) -> Result<(), Error>,
    {
        let mut page = match deferred {
            Some(deferred) if deferred.owner() != self.id => {
                return Err(Error::ForeignPage {
                    sequence: deferred.sequence(),
                });
            }
            Some(deferred) => deferred.resume(),
            None => self.start_page(viewport)?,
        };
        match draw(&mut page) {
            Ok(()) => self.finish_page(page),
            Err(e) => {
                self.abort_page(page);
                Err(e)
            }
        }
    }

    fn flush_ready(&mut self) -> Result<(), Error> {
        loop {
            if let Some(bytes) = self.finished.remove(&self.next_to_write) {
                self.out.write_all(&bytes)?;
                self.pages_written += 1;
                self.bytes_written += bytes.len();
            } else if !self.aborted.remove(&self.next_to_write) {
                return Ok(());
            }
            self.next_to_write += 1;
        }
    }

    /// Writes every pending page in document order, closes the document and
    /// hands back the output.
    pub fn end_document(mut self) -> Result<W, Error> {
        if !self.open.is_empty() {
            log::warn!(
                "{} page(s) never finished, omitted from output: {:?}",
                self.open.len(),
                self.open.iter().map(|s| s + 1).collect::<Vec<_>>()
            );
        }
        for (sequence, bytes) in std::mem::take(&mut self.finished) {
            if sequence != self.next_to_write {
                log::warn!(
                    "writing page {} after gap at page {}",
                    sequence + 1,
                    self.next_to_write + 1
                );
            }
            self.out.write_all(&bytes)?;
            self.pages_written += 1;
            self.bytes_written += bytes.len();
            self.next_to_write = sequence + 1;
        }

        let trailer = records::end_document(DOCUMENT_NAME).serialize()?;
        self.out.write_all(&trailer)?;
        self.out.flush()?;
        self.bytes_written += trailer.len();

        log::info!(
            "Document: {} page(s), {} bytes, {:.1}ms",
            self.pages_written,
            self.bytes_written,
            self.started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(self.out)
    }
}
