//! One page being rendered: its private output buffer, transform stack, font
//! registry and drawing operations.
//!
//! A page owns everything it mutates, so independent pages can be drawn on
//! different threads and merged afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use super::field::StructuredField;
use super::image::image_object;
use super::ptoca::MAX_TRANSPARENT_DATA;
use super::records::{self, TextPlacement};
use crate::border::{RuleSegment, decompose};
use crate::config::RendererOptions;
use crate::error::Error;
use crate::fonts::{CodePage, FontHandle, FontService};
use crate::model::{
    BorderLine, DataObject, ImageArea, PageSetup, PageViewport, Rect, Rotation, TextRun, WHITE,
    mpt_to_units,
};
use crate::raster::ImageRecord;
use crate::transform::{Ctm, TransformStack, ViewportFrame};

/// Highest local font reference a page can allocate.
pub const MAX_FONT_REFERENCE: usize = 254;

/// Text bytes carried by one presentation text record. Longer runs continue
/// in further records.
const TEXT_BYTES_PER_RECORD: usize = 200 * MAX_TRANSPARENT_DATA;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    /// Started and open for drawing. A page from `start_page` stays here until
    /// it is finished, aborted or deferred.
    Preparing,
    /// Suspended inside a [`DeferredPage`].
    Deferred,
    /// Taken back from a [`DeferredPage`] and open for drawing again.
    Resuming,
    Finalized,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontAttributes {
    pub key: String,
    pub reference: u8,
    pub handle: FontHandle,
    /// Size in millipoints.
    pub point_size: i32,
}

/// Fonts used on one page, in first-use order. References start at 1.
#[derive(Clone, Debug, Default)]
pub struct FontRegistry {
    fonts: Vec<FontAttributes>,
    index: HashMap<String, usize>,
}

impl FontRegistry {
    /// Returns the entry for `key`, allocating the next reference on first use.
    pub fn register(
        &mut self,
        key: &str,
        handle: FontHandle,
        point_size: i32,
    ) -> Result<&FontAttributes, Error> {
        if let Some(&i) = self.index.get(key) {
            return Ok(&self.fonts[i]);
        }
        if self.fonts.len() >= MAX_FONT_REFERENCE {
            return Err(Error::EncodingOverflow {
                what: "font reference",
                size: self.fonts.len() + 1,
                max: MAX_FONT_REFERENCE,
            });
        }
        let reference = (self.fonts.len() + 1) as u8;
        log::debug!("font {key} -> reference {reference}");
        self.index.insert(key.to_string(), self.fonts.len());
        self.fonts.push(FontAttributes {
            key: key.to_string(),
            reference,
            handle,
            point_size,
        });
        Ok(&self.fonts[self.fonts.len() - 1])
    }

    pub fn get(&self, key: &str) -> Option<&FontAttributes> {
        self.index.get(key).map(|&i| &self.fonts[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontAttributes> {
        self.fonts.iter()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct PageContext {
    /// Page width in device units.
    pub width: i32,
    pub height: i32,
    pub landscape: bool,
    /// Rotation configured for this page's class.
    pub rotation: Rotation,
    pub fonts: FontRegistry,
    /// Image source locator to page segment name.
    pub page_segments: HashMap<String, String>,
    pub fill_color: [u8; 3],
}

pub struct Page {
    /// Id of the renderer that started the page.
    owner: u64,
    sequence: usize,
    name: String,
    state: PageState,
    context: PageContext,
    transform: TransformStack,
    buf: Vec<u8>,
    text_object: Option<String>,
    text_objects: usize,
    images: usize,
    options: RendererOptions,
    font_service: Arc<dyn FontService>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("sequence", &self.sequence)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("bytes", &self.buf.len())
            .field("depth", &self.transform.depth())
            .finish()
    }
}

impl Page {
    /// Starts page `sequence` (0-based document position): writes the page
    /// header through the environment group and applies the viewport's setup.
    pub(crate) fn begin(
        owner: u64,
        sequence: usize,
        viewport: &PageViewport,
        options: RendererOptions,
        font_service: Arc<dyn FontService>,
    ) -> Result<Self, Error> {
        if viewport.width <= 0 || viewport.height <= 0 {
            return Err(Error::InvalidGeometry(format!(
                "page viewport {}x{} has no area",
                viewport.width, viewport.height
            )));
        }
        let width = mpt_to_units(viewport.width as f64);
        let height = mpt_to_units(viewport.height as f64);
        let landscape = viewport.is_landscape();
        let name = format!("PGN{:05}", sequence + 1);

        let mut page = Self {
            owner,
            sequence,
            name,
            state: PageState::Preparing,
            context: PageContext {
                width,
                height,
                landscape,
                rotation: options.page_rotation(landscape),
                fonts: FontRegistry::default(),
                page_segments: HashMap::new(),
                fill_color: WHITE,
            },
            transform: TransformStack::new(width, height),
            buf: Vec::new(),
            text_object: None,
            text_objects: 0,
            images: 0,
            options,
            font_service,
        };

        page.write_all(&[
            records::begin_page(&page.name),
            records::begin_active_environment_group(&page.name),
            records::page_descriptor(width, height),
            records::presentation_text_descriptor(width, height),
            records::end_active_environment_group(&page.name),
        ])?;

        for setup in &viewport.setup {
            match setup {
                PageSetup::IncludePageOverlay { name } => {
                    let rotation = page.context.rotation;
                    page.write(&records::include_page_overlay(name, 0, 0, rotation))?;
                }
                PageSetup::IncludePageSegment { name, source } => {
                    page.context
                        .page_segments
                        .insert(source.clone(), name.clone());
                }
                PageSetup::TagLogicalElement { name, value } => {
                    page.write(&records::tag_logical_element(name, value))?;
                }
                PageSetup::NoOperation { content } => {
                    page.write(&records::no_operation(content))?;
                }
            }
        }

        log::debug!(
            "begin page {} ({}x{} units, {} rotation {})",
            page.name,
            width,
            height,
            if landscape { "landscape" } else { "portrait" },
            page.context.rotation.degrees()
        );
        Ok(page)
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn transform_depth(&self) -> usize {
        self.transform.depth()
    }

    pub fn current_frame(&self) -> ViewportFrame {
        self.transform.current()
    }

    /// Bytes written for this page so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    fn write(&mut self, field: &StructuredField) -> Result<(), Error> {
        field.write_to(&mut self.buf)
    }

    /// Appends several fields, or none of them if any fails to encode.
    fn write_all(&mut self, fields: &[StructuredField]) -> Result<(), Error> {
        let mut staged = Vec::new();
        for field in fields {
            field.write_to(&mut staged)?;
        }
        self.buf.extend(staged);
        Ok(())
    }

    fn open_text_object(&mut self) -> Result<(), Error> {
        if self.text_object.is_none() {
            let name = format!("PTX{:05}", self.text_objects + 1);
            self.write(&records::begin_presentation_text(&name))?;
            self.text_objects += 1;
            self.text_object = Some(name);
        }
        Ok(())
    }

    fn close_text_object(&mut self) -> Result<(), Error> {
        if let Some(name) = self.text_object.take() {
            self.write(&records::end_presentation_text(&name))?;
        }
        Ok(())
    }

    /// Writes presentation text data inside the open text object.
    fn write_text_data(&mut self, fields: &[StructuredField]) -> Result<(), Error> {
        let mut staged = Vec::new();
        for field in fields {
            field.write_to(&mut staged)?;
        }
        self.open_text_object()?;
        self.buf.extend(staged);
        Ok(())
    }

    /// Writes non-text content, closing any open text object first.
    fn write_object(&mut self, fields: &[StructuredField]) -> Result<(), Error> {
        let mut staged = Vec::new();
        for field in fields {
            field.write_to(&mut staged)?;
        }
        self.close_text_object()?;
        self.buf.extend(staged);
        Ok(())
    }

    pub fn push_viewport(&mut self, view: &Rect, ctm: &Ctm) -> ViewportFrame {
        self.transform.push(view, ctm)
    }

    pub fn pop_viewport(&mut self) -> Result<ViewportFrame, Error> {
        self.transform.pop()
    }

    /// Sets the fill color used by rectangles. Stroke colors travel with each
    /// line and text run, so only fill updates change page state.
    pub fn update_color(&mut self, color: [u8; 3], fill: bool) {
        if fill {
            self.context.fill_color = color;
        }
    }

    /// Fills `rect` (millipoints, viewport relative) with the current fill color.
    pub fn fill_rect(&mut self, rect: &Rect) -> Result<(), Error> {
        if rect.width < 0 || rect.height < 0 {
            log::warn!("skipping rectangle with negative extent {rect:?}");
            return Ok(());
        }
        let (x1, y1) = self.transform.to_device(rect.x as f64, rect.y as f64);
        let (x2, _) = self
            .transform
            .to_device((rect.x + rect.width) as f64, rect.y as f64);
        let thickness = mpt_to_units(rect.height as f64);
        self.draw_rule(x1, y1, x2, y1, thickness, self.context.fill_color)
    }

    fn draw_rule(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        thickness: i32,
        color: [u8; 3],
    ) -> Result<(), Error> {
        let rotation = self.transform.current().rotation;
        match records::line_data(x1, y1, x2, y2, thickness, rotation, color) {
            Some(field) => self.write_text_data(&[field]),
            None => {
                log::warn!("skipping diagonal rule ({x1}, {y1}) -> ({x2}, {y2})");
                Ok(())
            }
        }
    }

    fn draw_segment(&mut self, segment: &RuleSegment) -> Result<(), Error> {
        let (x1, y1) = self.transform.to_device(segment.x, segment.y);
        let (ex, ey) = segment.end();
        let (x2, y2) = if segment.horizontal {
            (self.transform.to_device(ex, ey).0, y1)
        } else {
            (x1, self.transform.to_device(ex, ey).1)
        };
        let thickness = mpt_to_units(segment.thickness);
        self.draw_rule(x1, y1, x2, y2, thickness, segment.color)
    }

    /// Draws a styled border line. Degenerate lines are skipped with a warning.
    pub fn draw_border_line(&mut self, line: &BorderLine) -> Result<(), Error> {
        let segments = match decompose(line) {
            Ok(segments) => segments,
            Err(Error::InvalidGeometry(msg)) => {
                log::warn!("skipping border line: {msg}");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        for segment in &segments {
            self.draw_segment(segment)?;
        }
        Ok(())
    }

    pub fn draw_text(&mut self, run: &TextRun) -> Result<(), Error> {
        let Some(handle) = self.font_service.lookup(&run.font_key, run.font_size) else {
            log::warn!(
                "no font for key '{}' at {}mpt, skipping text {:?}",
                run.font_key,
                run.font_size,
                run.text
            );
            return Ok(());
        };
        let encoding = match self.font_service.encoding(&handle, run.font_size) {
            Ok(encoding) => encoding,
            Err(e) => {
                log::warn!(
                    "{e}; using default encoding {} for '{}'",
                    CodePage::DEFAULT.name(),
                    run.font_key
                );
                CodePage::DEFAULT
            }
        };

        let space = self.font_service.char_width(&handle, ' ', run.font_size);
        let key = format!("{}/{}/{}", run.font_key, run.font_size, encoding.name());
        let reference = self
            .context
            .fonts
            .register(&key, handle, run.font_size)?
            .reference;

        let (x, y) = self.transform.to_device(run.x as f64, run.y as f64);
        let data = encoding.encode(&run.text);
        let (first, rest) = data.split_at(data.len().min(TEXT_BYTES_PER_RECORD));
        let mut fields = vec![records::text_data(&TextPlacement {
            font_reference: reference,
            x,
            y,
            rotation: self.transform.current().rotation,
            color: run.color,
            variable_space_increment: mpt_to_units(
                (space + run.word_space_adjust + run.letter_space_adjust) as f64,
            ),
            intercharacter_adjustment: mpt_to_units(run.letter_space_adjust as f64),
            data: first,
        })];
        fields.extend(rest.chunks(TEXT_BYTES_PER_RECORD).map(records::text_continuation));
        self.write_text_data(&fields)
    }

    /// Draws an image, or includes the registered page segment for its source.
    pub fn draw_image(&mut self, image: &ImageArea) -> Result<(), Error> {
        let pos = &image.position;
        let (x, y) = self.transform.to_device(pos.x as f64, pos.y as f64);

        if let Some(segment) = self.context.page_segments.get(&image.uri).cloned() {
            log::debug!("{} -> page segment {segment}", image.uri);
            return self.write_object(&[records::include_page_segment(&segment, x, y)]);
        }

        let viewport = Rect::new(
            x,
            y,
            mpt_to_units(pos.width as f64),
            mpt_to_units(pos.height as f64),
        );
        let record = match ImageRecord::from_image_data(&image.data, viewport, &self.options) {
            Ok(record) => record,
            Err(Error::UnsupportedImageFormat(msg)) => {
                log::warn!("skipping image {}: {msg}", image.uri);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let name = format!("IMG{:05}", self.images + 1);
        let rotation = self.transform.current().rotation;
        self.write_object(&image_object(&name, &record, rotation))?;
        self.images += 1;
        Ok(())
    }

    /// Maps a data object resource and places it on the page.
    pub fn include_data_object(&mut self, object: &DataObject) -> Result<(), Error> {
        let pos = &object.position;
        let (x, y) = self.transform.to_device(pos.x as f64, pos.y as f64);
        let rotation = self.transform.current().rotation;
        self.write_object(&[
            records::map_data_resource(object),
            records::include_object(
                &object.name,
                x,
                y,
                mpt_to_units(pos.width as f64),
                mpt_to_units(pos.height as f64),
                rotation,
            ),
        ])
    }

    /// Suspends the page. Its buffer and context travel with the handle.
    pub fn defer(mut self) -> DeferredPage {
        log::debug!(
            "defer page {} ({} bytes, {} fonts, depth {})",
            self.name,
            self.buf.len(),
            self.context.fonts.len(),
            self.transform.depth()
        );
        self.state = PageState::Deferred;
        DeferredPage { page: self }
    }

    /// Completes the page: closes open objects, writes one font map per
    /// registered font and the page end, and empties the transform stack.
    pub(crate) fn finish(mut self) -> Result<Vec<u8>, Error> {
        let mut trailer = Vec::new();
        if let Some(name) = &self.text_object {
            records::end_presentation_text(name).write_to(&mut trailer)?;
        }
        for font in self.context.fonts.iter() {
            records::map_coded_font(
                font.reference,
                &font.handle.character_set,
                &font.handle.code_page,
                font.point_size,
            )
            .write_to(&mut trailer)?;
        }
        records::end_page(&self.name).write_to(&mut trailer)?;

        self.text_object = None;
        self.buf.extend(trailer);
        self.transform.release();
        self.state = PageState::Finalized;
        log::debug!("finish page {} ({} bytes)", self.name, self.buf.len());
        Ok(self.buf)
    }
}

/// A prepared page waiting to be resumed. Owning the handle is the only way to
/// continue the page.
#[derive(Debug)]
pub struct DeferredPage {
    page: Page,
}

impl DeferredPage {
    pub(crate) fn owner(&self) -> u64 {
        self.page.owner
    }

    pub fn sequence(&self) -> usize {
        self.page.sequence
    }

    pub fn state(&self) -> PageState {
        self.page.state
    }

    pub fn context(&self) -> &PageContext {
        &self.page.context
    }

    pub fn transform_depth(&self) -> usize {
        self.page.transform.depth()
    }

    /// Continues the page exactly where it was deferred.
    pub fn resume(mut self) -> Page {
        self.page.state = PageState::Resuming;
        log::debug!("resume page {}", self.page.name);
        self.page
    }
}
