mod common;

use std::sync::Arc;

use afp_render::afp::ObjectType;
use afp_render::fonts::StandardFonts;
use afp_render::model::{
    BLACK, Bitmap, BorderLine, BorderStyle, DataObject, ImageArea, ImageData, PageSetup,
    PageViewport, Rect, ResourceLocation, Rotation, TextRun,
};
use afp_render::{Ctm, Error, Page, PageState, Renderer, RendererOptions};
use common::*;

fn text(font_key: &str, size: i32, x: i32, y: i32, s: &str) -> TextRun {
    TextRun {
        font_key: font_key.to_string(),
        font_size: size,
        x,
        y,
        color: BLACK,
        text: s.to_string(),
        word_space_adjust: 0,
        letter_space_adjust: 0,
    }
}

fn bitmap_area(uri: &str, width: u32, height: u32) -> ImageArea {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    ImageArea {
        uri: uri.to_string(),
        position: Rect::new(72_000, 72_000, 72_000, 36_000),
        data: ImageData::Bitmap(Bitmap::from_rgb_image(&img, 240.0)),
    }
}

fn draw_sample(page: &mut Page, label: &str) -> Result<(), Error> {
    page.draw_text(&text("sans-serif", 12_000, 72_000, 100_000, label))?;
    page.draw_border_line(&BorderLine {
        style: BorderStyle::Double,
        x1: 72_000.0,
        y1: 120_000.0,
        x2: 300_000.0,
        y2: 123_000.0,
        horizontal: true,
        color: BLACK,
    })?;
    page.draw_text(&text("monospace", 10_000, 72_000, 140_000, label))
}

fn ptx_sequences(fields: &[Field]) -> Vec<Vec<(u8, Vec<u8>)>> {
    fields
        .iter()
        .filter(|f| f.id == PTX)
        .map(|f| control_sequences(&f.data))
        .collect()
}

fn find(seqs: &[(u8, Vec<u8>)], function: u8) -> Option<&Vec<u8>> {
    seqs.iter().find(|(t, _)| t & 0xFE == function).map(|(_, p)| p)
}

#[test]
fn single_rule_page() {
    init_logging();
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_border_line(&BorderLine {
                style: BorderStyle::Solid,
                x1: 0.0,
                y1: 0.0,
                x2: 30_000.0,
                y2: 15_000.0,
                horizontal: true,
                color: BLACK,
            })
        })
        .expect("render page");
    let bytes = renderer.end_document().expect("end document");
    let fields = split_fields(&bytes);

    assert_eq!(count(&fields, PGD), 1);
    assert_eq!(count(&fields, PTX), 1);
    assert_eq!(count(&fields, EPG), 1);
    assert_eq!(count(&fields, MCF), 0);
    assert_eq!(fields.first().map(|f| f.id), Some(BDT));
    assert_eq!(fields.last().map(|f| f.id), Some(EDT));

    let pgd = fields.iter().find(|f| f.id == PGD).expect("PGD");
    assert_eq!(&pgd.data[6..12], &[0x00, 0x07, 0xF8, 0x00, 0x0A, 0x50]);

    let all = ptx_sequences(&fields);
    let seqs = &all[0];
    assert_eq!(find(seqs, 0xD2), Some(&vec![0x00, 0x00]));
    assert_eq!(find(seqs, 0xC6), Some(&vec![0x00, 0x00]));
    let sec = find(seqs, 0x80).expect("SEC");
    assert_eq!(&sec[10..], &[0, 0, 0]);
    assert_eq!(seqs.last(), Some(&(0xE4, vec![0x00, 100, 0x00, 50, 0x00])));
}

#[test]
fn page_layout_order() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("serif", 10_000, 0, 10_000, "x"))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    let order = ids(&fields);
    let expected = vec![
        BDT,
        BPG,
        (0xA8, 0xC9),
        PGD,
        (0xB1, 0x9B),
        (0xA9, 0xC9),
        BPT,
        PTX,
        EPT,
        MCF,
        EPG,
        EDT,
    ];
    assert_eq!(order, expected);
}

#[test]
fn fill_rect_uses_fill_color_only() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.fill_rect(&Rect::new(0, 0, 3_000, 3_000))?;
            page.update_color([200, 0, 0], false);
            page.fill_rect(&Rect::new(0, 0, 3_000, 3_000))?;
            page.update_color([0, 0, 200], true);
            assert_eq!(page.context().fill_color, [0, 0, 200]);
            page.fill_rect(&Rect::new(3_000, 6_000, 30_000, 9_000))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    let colors: Vec<Vec<u8>> = ptx_sequences(&fields)
        .iter()
        .map(|s| find(s, 0x80).expect("SEC")[10..].to_vec())
        .collect();
    assert_eq!(colors, vec![vec![255, 255, 255], vec![255, 255, 255], vec![0, 0, 200]]);

    let last = ptx_sequences(&fields).pop().expect("rule");
    assert_eq!(find(&last, 0xD2), Some(&vec![0x00, 20]));
    assert_eq!(find(&last, 0xC6), Some(&vec![0x00, 10]));
    assert_eq!(last.last(), Some(&(0xE4, vec![0x00, 100, 0x00, 30, 0x00])));
}

#[test]
fn font_references_are_per_page() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("sans-serif", 12_000, 0, 20_000, "one"))?;
            page.draw_text(&text("sans-serif", 12_000, 0, 40_000, "two"))?;
            page.draw_text(&text("serif", 12_000, 0, 60_000, "three"))?;
            page.draw_text(&text("sans-serif", 14_000, 0, 80_000, "four"))?;
            assert_eq!(page.context().fonts.len(), 3);
            Ok(())
        })
        .expect("render first page");
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("serif", 12_000, 0, 20_000, "five"))
        })
        .expect("render second page");
    let fields = split_fields(&renderer.end_document().expect("end document"));

    let refs: Vec<u8> = ptx_sequences(&fields)
        .iter()
        .map(|s| find(s, 0xF0).expect("SCFL")[0])
        .collect();
    assert_eq!(refs, vec![1, 1, 2, 3, 1]);

    let pages: Vec<&[Field]> = fields.split(|f| f.id == EPG).collect();
    assert_eq!(count(pages[0], MCF), 3);
    assert_eq!(count(pages[1], MCF), 1);
}

#[test]
fn text_is_encoded_with_spacing() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            let mut run = text("sans-serif", 10_000, 30_000, 60_000, "Hi");
            run.word_space_adjust = 600;
            run.letter_space_adjust = 300;
            page.draw_text(&run)
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    let all = ptx_sequences(&fields);
    let seqs = &all[0];
    assert_eq!(find(seqs, 0xD2), Some(&vec![0x00, 200]));
    assert_eq!(find(seqs, 0xC6), Some(&vec![0x00, 100]));
    // space 2780 + 600 + 300 millipoints
    assert_eq!(find(seqs, 0xC4), Some(&vec![0x00, 12]));
    assert_eq!(find(seqs, 0xC2), Some(&vec![0x00, 1, 0x00]));
    assert_eq!(seqs.last(), Some(&(0xDA, vec![0xC8, 0x89])));
}

#[test]
fn missing_encoding_falls_back_to_ebcdic() {
    init_logging();
    let fonts = Arc::new(NoEncodingFonts(StandardFonts::default()));
    let mut renderer =
        Renderer::new(Vec::new(), RendererOptions::default(), fonts).expect("open document");
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("sans-serif", 10_000, 0, 10_000, "A"))?;
            assert!(page.context().fonts.get("sans-serif/10000/Cp500").is_some());
            Ok(())
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, PTX), 1);
    assert_eq!(count(&fields, MCF), 1);
    assert_eq!(ptx_sequences(&fields)[0].last(), Some(&(0xDA, vec![0xC1])));
}

#[test]
fn unknown_font_skips_text() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("fantasy", 10_000, 0, 10_000, "A"))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, PTX), 0);
    assert_eq!(count(&fields, MCF), 0);
    assert_eq!(count(&fields, EPG), 1);
}

#[test]
fn degenerate_border_is_skipped() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_border_line(&BorderLine {
                style: BorderStyle::Solid,
                x1: 10_000.0,
                y1: 0.0,
                x2: 0.0,
                y2: 1_000.0,
                horizontal: true,
                color: BLACK,
            })
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, PTX), 0);
    assert_eq!(count(&fields, EPG), 1);
}

#[test]
fn image_object_is_written_in_chunks() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_image(&bitmap_area("small.png", 20, 10))?;
            page.draw_image(&bitmap_area("large.png", 100, 100))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, BIM), 2);

    let ipd: Vec<&Field> = fields.iter().filter(|f| f.id == IPD).collect();
    // small: header, one chunk, end; large: header, two chunks, end
    assert_eq!(ipd.len(), 3 + 4);
    assert_eq!(&ipd[1].data[..4], &[0xFE, 0x92, 0x00, 200]);
    assert!(ipd[1].data[4..].iter().all(|&b| b == 255));
    assert_eq!(&ipd[5].data[..4], &[0xFE, 0x92, 0x07, 0x10]);
    assert_eq!(ipd[2].data, vec![0x93, 0x00, 0x71, 0x00]);

    let header = &ipd[0].data;
    assert_eq!(&header[..5], &[0x70, 0x00, 0x91, 0x01, 0xFF]);
    assert_eq!(&header[5..16], &[0x94, 0x09, 0x00, 0x09, 0x60, 0x09, 0x60, 0x00, 20, 0x00, 10]);
    assert_eq!(&header[16..20], &[0x95, 0x02, 0x03, 0x01]);
    assert_eq!(&header[20..23], &[0x96, 0x01, 8]);
}

#[test]
fn unsupported_image_is_skipped() {
    init_logging();
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_image(&ImageArea {
                uri: "figure.eps".to_string(),
                position: Rect::new(0, 0, 72_000, 72_000),
                data: ImageData::Unsupported {
                    mime: "application/postscript".to_string(),
                },
            })
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, BIM), 0);
    assert_eq!(count(&fields, EPG), 1);
}

#[test]
fn registered_page_segment_replaces_image() {
    let mut viewport = letter();
    viewport.setup.push(PageSetup::IncludePageSegment {
        name: "S1LOGO".to_string(),
        source: "logo.png".to_string(),
    });
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&viewport, None, |page| {
            page.draw_image(&bitmap_area("logo.png", 4, 4))?;
            page.draw_image(&bitmap_area("photo.png", 4, 4))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, IPS), 1);
    assert_eq!(count(&fields, BIM), 1);

    let ips = fields.iter().find(|f| f.id == IPS).expect("IPS");
    // "S1LOGO  " then x = y = 240 units
    assert_eq!(&ips.data[..2], &[0xE2, 0xF1]);
    assert_eq!(&ips.data[8..], &[0x00, 0x00, 0xF0, 0x00, 0x00, 0xF0]);
}

#[test]
fn page_setup_extensions_follow_the_environment_group() {
    let mut viewport = PageViewport::new(792_000, 612_000);
    viewport.setup = vec![
        PageSetup::IncludePageOverlay {
            name: "O1FORM".to_string(),
        },
        PageSetup::TagLogicalElement {
            name: "Account".to_string(),
            value: "42".to_string(),
        },
        PageSetup::NoOperation {
            content: "batch 7".to_string(),
        },
    ];
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&viewport, None, |page| {
            assert!(page.context().landscape);
            assert_eq!(page.context().rotation, Rotation::Deg270);
            Ok(())
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    let order = ids(&fields);
    let eag = order.iter().position(|&id| id == (0xA9, 0xC9)).expect("EAG");
    assert_eq!(&order[eag + 1..eag + 4], &[IPO, TLE, NOP]);

    let ipo = &fields[eag + 1];
    assert_eq!(&ipo.data[14..16], &[0x87, 0x00]);
    let nop = &fields[eag + 3];
    assert_eq!(nop.data.len(), "batch 7".len());
}

#[test]
fn data_object_is_mapped_then_included() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("serif", 10_000, 0, 10_000, "before"))?;
            page.include_data_object(&DataObject {
                name: "CHART1".to_string(),
                location: ResourceLocation::External {
                    path: "chart.pdf".to_string(),
                },
                object_type: ObjectType::PdfSinglePage,
                position: Rect::new(72_000, 72_000, 144_000, 72_000),
            })
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    let order = ids(&fields);
    let mdr = order.iter().position(|&id| id == MDR).expect("MDR");
    assert_eq!(order[mdr - 1], EPT);
    assert_eq!(order[mdr + 1], IOB);
    let iob = &fields[mdr + 1];
    assert_eq!(&iob.data[10..16], &[0x00, 0x00, 0xF0, 0x00, 0x00, 0xF0]);
}

#[test]
fn rotated_viewport_orients_text() {
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.push_viewport(
                &Rect::new(72_000, 72_000, 144_000, 72_000),
                &Ctm::rotation(Rotation::Deg90),
            );
            page.draw_text(&text("serif", 10_000, 0, 10_000, "up"))?;
            page.pop_viewport()?;
            assert!(matches!(page.pop_viewport(), Err(Error::TransformUnderflow)));
            page.draw_text(&text("serif", 10_000, 0, 10_000, "flat"))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    let seqs = ptx_sequences(&fields);
    assert_eq!(find(&seqs[0], 0xF6), Some(&vec![0x2D, 0x00, 0x5A, 0x00]));
    assert_eq!(find(&seqs[1], 0xF6), Some(&vec![0x00, 0x00, 0x2D, 0x00]));
}

#[test]
fn out_of_order_rendering_matches_document_order() {
    let mut direct = renderer(RendererOptions::default());
    for label in ["page A", "page B"] {
        direct
            .render_page(&letter(), None, |page| draw_sample(page, label))
            .expect("render");
    }
    let expected = direct.end_document().expect("end document");

    let mut deferred = renderer(RendererOptions::default());
    let a = deferred.prepare_page(&letter()).expect("prepare A");
    let b = deferred.prepare_page(&letter()).expect("prepare B");
    assert_eq!(a.state(), PageState::Deferred);
    assert_eq!((a.sequence(), b.sequence()), (0, 1));
    deferred
        .render_page(&letter(), Some(b), |page| {
            assert_eq!(page.state(), PageState::Resuming);
            draw_sample(page, "page B")
        })
        .expect("render B");
    deferred
        .render_page(&letter(), Some(a), |page| draw_sample(page, "page A"))
        .expect("render A");
    let actual = deferred.end_document().expect("end document");

    assert_eq!(actual, expected);
}

#[test]
fn deferral_preserves_fonts_and_transform_depth() {
    let mut renderer = renderer(RendererOptions::default());
    let mut page = renderer.start_page(&letter()).expect("start");
    page.push_viewport(&Rect::new(0, 0, 100_000, 100_000), &Ctm::IDENTITY);
    page.draw_text(&text("serif", 10_000, 0, 10_000, "a")).expect("text");
    let before = page.bytes().to_vec();

    let deferred = page.defer();
    assert_eq!(deferred.transform_depth(), 2);
    assert_eq!(deferred.context().fonts.len(), 1);

    let mut page = deferred.resume();
    assert_eq!(page.bytes(), &before[..]);
    assert_eq!(page.transform_depth(), 2);
    page.draw_text(&text("serif", 10_000, 0, 20_000, "b")).expect("text");
    assert_eq!(page.context().fonts.len(), 1);
    page.pop_viewport().expect("pop");
    renderer.finish_page(page).expect("finish");

    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, PTX), 2);
    assert_eq!(count(&fields, BPT), 1);
    assert_eq!(count(&fields, MCF), 1);
}

#[test]
fn failed_page_is_dropped_without_blocking_later_pages() {
    init_logging();
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| draw_sample(page, "kept"))
        .expect("first page");
    let failed = renderer.render_page(&letter(), None, |page| {
        draw_sample(page, "lost")?;
        Err(Error::EncodingOverflow {
            what: "test",
            size: 2,
            max: 1,
        })
    });
    assert!(matches!(failed, Err(Error::EncodingOverflow { .. })));
    renderer
        .render_page(&letter(), None, |page| draw_sample(page, "third"))
        .expect("third page");
    let fields = split_fields(&renderer.end_document().expect("end document"));

    let names: Vec<Vec<u8>> = fields
        .iter()
        .filter(|f| f.id == BPG)
        .map(|f| f.data.clone())
        .collect();
    // PGN00001 and PGN00003 in EBCDIC
    assert_eq!(names.len(), 2);
    assert_eq!(names[0][7], 0xF1);
    assert_eq!(names[1][7], 0xF3);
}

#[test]
fn abandoned_page_leaves_a_gap() {
    init_logging();
    let mut renderer = renderer(RendererOptions::default());
    let _never = renderer.prepare_page(&letter()).expect("prepare");
    renderer
        .render_page(&letter(), None, |page| draw_sample(page, "second"))
        .expect("second page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, BPG), 1);
    assert_eq!(fields.last().map(|f| f.id), Some(EDT));
}

#[test]
fn page_from_another_document_is_rejected() {
    init_logging();
    let mut first = renderer(RendererOptions::default());
    let mut second = renderer(RendererOptions::default());

    // both renderers have sequence 0 open
    let own = second.start_page(&letter()).expect("start own page");
    let foreign = first.start_page(&letter()).expect("start foreign page");
    assert!(matches!(
        second.finish_page(foreign),
        Err(Error::ForeignPage { sequence: 0 })
    ));
    second.finish_page(own).expect("finish own page");

    let reserved = second.prepare_page(&letter()).expect("prepare own page");
    let foreign = first.prepare_page(&letter()).expect("prepare foreign page");
    assert!(matches!(
        second.render_page(&letter(), Some(foreign), |_| Ok(())),
        Err(Error::ForeignPage { sequence: 1 })
    ));
    second
        .render_page(&letter(), Some(reserved), |page| draw_sample(page, "own"))
        .expect("resume own page");

    let own = second.start_page(&letter()).expect("start own page");
    second.abort_page(first.start_page(&letter()).expect("start foreign page"));
    second.finish_page(own).expect("finish after foreign abort");

    let fields = split_fields(&second.end_document().expect("end document"));
    assert_eq!(count(&fields, BPG), 3);
    assert_eq!(count(&fields, EPG), 3);
}

#[test]
fn started_page_reports_preparing_until_deferred() {
    let mut renderer = renderer(RendererOptions::default());
    let mut page = renderer.start_page(&letter()).expect("start");
    assert_eq!(page.state(), PageState::Preparing);
    draw_sample(&mut page, "drawing").expect("draw");
    assert_eq!(page.state(), PageState::Preparing);
    let deferred = page.defer();
    assert_eq!(deferred.state(), PageState::Deferred);
    let page = deferred.resume();
    assert_eq!(page.state(), PageState::Resuming);
    renderer.finish_page(page).expect("finish");
}

#[test]
fn long_text_run_continues_in_further_records() {
    let long = "a".repeat(70_000);
    let mut renderer = renderer(RendererOptions::default());
    renderer
        .render_page(&letter(), None, |page| {
            page.draw_text(&text("sans-serif", 10_000, 0, 20_000, &long))
        })
        .expect("render page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, MCF), 1);

    let all = ptx_sequences(&fields);
    assert_eq!(all.len(), 2);
    assert!(find(&all[0], 0xF0).is_some());
    assert!(all[1].iter().all(|(t, _)| t & 0xFE == 0xDA));
    for seqs in &all {
        assert_eq!(seqs.last().map(|(t, _)| *t), Some(0xDA));
    }

    let decoded: Vec<u8> = all
        .iter()
        .flatten()
        .filter(|(t, _)| t & 0xFE == 0xDA)
        .flat_map(|(_, p)| p.iter().copied())
        .collect();
    assert_eq!(decoded.len(), 70_000);
    // 'a' in EBCDIC
    assert!(decoded.iter().all(|&b| b == 0x81));
}

#[test]
fn oversized_image_drops_the_page() {
    init_logging();
    let mut renderer = renderer(RendererOptions::default());
    let failed = renderer.render_page(&letter(), None, |page| {
        page.draw_image(&bitmap_area("wide.png", 70_000, 1))
    });
    assert!(matches!(
        failed,
        Err(Error::EncodingOverflow {
            what: "image size",
            size: 70_000,
            ..
        })
    ));
    renderer
        .render_page(&letter(), None, |page| draw_sample(page, "second"))
        .expect("second page");
    let fields = split_fields(&renderer.end_document().expect("end document"));
    assert_eq!(count(&fields, BPG), 1);
    assert_eq!(count(&fields, BIM), 0);
}

#[test]
fn empty_viewport_is_rejected() {
    let mut renderer = renderer(RendererOptions::default());
    assert!(matches!(
        renderer.start_page(&PageViewport::new(0, 792_000)),
        Err(Error::InvalidGeometry(_))
    ));
}
