use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use paperlens_core::{
    extract_page_chunks, parse_topics, AddPaper, HashingEmbedder, IngestError, Library,
    LibraryOptions, LocalCollection, LocalStore, VectorIndex, IMAGES_COLLECTION, MIN_PAGE_CHARS,
    PAPERS_COLLECTION,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

type TestLibrary = Library<HashingEmbedder, LocalCollection, LocalCollection>;

const LONG_PAGE_ONE: &str =
    "Convolutional networks learn hierarchical visual features from raw image pixels";
const LONG_PAGE_TWO: &str =
    "We evaluate the backbone on object detection and semantic segmentation benchmarks";

fn write_pdf(path: &Path, page_texts: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![40.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_texts.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

fn write_png(path: &Path, shade: u8) -> Result<(), Box<dyn std::error::Error>> {
    RgbImage::from_fn(24, 24, |x, y| Rgb([shade, (x * 10) as u8, (y * 10) as u8])).save(path)?;
    Ok(())
}

struct Fixture {
    dir: TempDir,
    library: TestLibrary,
}

impl Fixture {
    async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let embedder = HashingEmbedder::default();
        let store = LocalStore::open(dir.path().join("db")).await?;
        let papers = store
            .collection(PAPERS_COLLECTION, embedder.dimensions)
            .await?;
        let images = store
            .collection(IMAGES_COLLECTION, embedder.dimensions)
            .await?;
        let library = Library::new(
            embedder,
            papers,
            images,
            LibraryOptions {
                data_root: dir.path().join("data"),
            },
        );
        Ok(Self { dir, library })
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

#[test]
fn extraction_drops_near_empty_pages() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("paper.pdf");
    write_pdf(&path, &[LONG_PAGE_ONE, "ten chars!", LONG_PAGE_TWO])?;

    let chunks = extract_page_chunks(&path);

    let pages = chunks.iter().map(|chunk| chunk.page).collect::<Vec<_>>();
    assert_eq!(pages, vec![1, 3]);
    assert!(chunks
        .iter()
        .all(|chunk| chunk.text.chars().count() >= MIN_PAGE_CHARS));
    assert!(chunks[0].text.contains("Convolutional networks"));
    Ok(())
}

#[test]
fn unreadable_pdf_yields_no_chunks() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.pdf");
    fs::write(&path, b"%PDF-1.4\n%broken")?;

    assert!(extract_page_chunks(&path).is_empty());
    assert!(extract_page_chunks(&dir.path().join("missing.pdf")).is_empty());
    Ok(())
}

#[tokio::test]
async fn three_page_paper_is_filed_and_indexed() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;
    let source = fixture.path("paper.pdf");
    write_pdf(&source, &[LONG_PAGE_ONE, LONG_PAGE_TWO, "ten chars!"])?;

    let topics = parse_topics("CV,NLP")?;
    let report = fixture
        .library
        .add_paper(AddPaper::new(&source).with_topics(topics.clone()))
        .await?;

    assert!(topics.contains(&report.topic));
    assert_eq!(report.pages_indexed, 2);
    let expected = fixture
        .path("data")
        .join(&report.topic)
        .join("paper.pdf");
    assert_eq!(report.stored_path, expected);
    assert!(expected.is_file());
    assert!(!source.exists());
    assert_eq!(fixture.library.papers().count().await?, 2);

    let hits = fixture
        .library
        .search_papers("semantic segmentation benchmarks", 5)
        .await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].key, "paper.pdf_p2");
    assert_eq!(hits[0].topic, report.topic);
    assert_eq!(hits[0].path, expected.to_string_lossy());
    Ok(())
}

#[tokio::test]
async fn reingesting_a_paper_overwrites_its_pages() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;
    let source = fixture.path("paper.pdf");
    write_pdf(&source, &[LONG_PAGE_ONE, LONG_PAGE_TWO])?;

    let first = fixture.library.add_paper(AddPaper::new(&source)).await?;
    let second = fixture
        .library
        .add_paper(AddPaper::new(&first.stored_path))
        .await?;

    assert_eq!(first.stored_path, second.stored_path);
    assert_eq!(second.topic, "Uncategorized");
    assert_eq!(fixture.library.papers().count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn paper_without_text_is_not_indexed() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;
    let source = fixture.path("scan.pdf");
    write_pdf(&source, &["tiny", "also tiny"])?;

    let result = fixture.library.add_paper(AddPaper::new(&source)).await;

    assert!(matches!(result, Err(IngestError::NoReadableText(_))));
    assert!(source.is_file());
    assert_eq!(fixture.library.papers().count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn corrupt_images_are_skipped_and_counted() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;
    let figures = fixture.path("data/CV/figures");
    fs::create_dir_all(&figures)?;
    write_png(&figures.join("encoder.png"), 20)?;
    write_png(&fixture.path("data/decoder.PNG"), 200)?;
    fs::write(figures.join("broken.jpg"), b"\xff\xd8\xff not really a jpeg")?;
    fs::write(figures.join("caption.txt"), b"ignored")?;

    let report = fixture.library.index_images(&fixture.path("data")).await?;

    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(fixture.library.images().count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn image_search_is_not_padded() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;
    let images = fixture.path("images");
    fs::create_dir_all(&images)?;
    write_png(&images.join("transformer.png"), 90)?;
    fixture.library.index_images(&images).await?;

    let hits = fixture
        .library
        .search_images("a diagram of transformer architecture", 3)
        .await?;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, "transformer.png");
    assert_eq!(hits[0].path, images.join("transformer.png").to_string_lossy());
    Ok(())
}

#[tokio::test]
async fn same_image_name_in_two_folders_keeps_one_record(
) -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;
    fs::create_dir_all(fixture.path("data/CV"))?;
    fs::create_dir_all(fixture.path("data/NLP"))?;
    write_png(&fixture.path("data/CV/fig1.png"), 10)?;
    write_png(&fixture.path("data/NLP/fig1.png"), 240)?;

    let report = fixture.library.index_images(&fixture.path("data")).await?;

    assert_eq!(report.indexed, 2);
    assert_eq!(fixture.library.images().count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn searching_an_empty_library_returns_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = Fixture::new().await?;

    assert!(fixture.library.search_papers("attention", 3).await?.is_empty());
    assert!(fixture
        .library
        .search_images("a cat on a sofa", 3)
        .await?
        .is_empty());
    Ok(())
}
