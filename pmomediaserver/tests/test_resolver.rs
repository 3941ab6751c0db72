//! Tests d'intégration du résolveur de requêtes
//!
//! Les fichiers servis sont créés dans un répertoire temporaire ; le
//! catalogue et les handlers spécialisés sont des implémentations de test.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pmodidl::{
    CatalogObject, ContentHandler, DidlBuilder, ObjectFlags, Resource, ResourceAttribute,
    ResourceLocator, ResourcePurpose, ResourceSelection, TranscodingProfile, render_protocol_info,
};
use pmomediaserver::{
    ByteRange, Catalog, CatalogError, HandlerError, MemoryCatalog, MetadataHandler,
    MetadataService, RequestResolver, ResolveError, ResourceInfo, ResourceStream,
};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

/// Catalogue dont le stockage est indisponible
struct BrokenCatalog;

#[async_trait]
impl Catalog for BrokenCatalog {
    async fn get_object_by_id(&self, _id: i64) -> Result<Arc<CatalogObject>, CatalogError> {
        Err(CatalogError::Backend("database is locked".to_string()))
    }
}

/// Handler de transcodage factice : renvoie un contenu fixe et compte les appels
#[derive(Default)]
struct FakeTranscoder {
    opened: AtomicUsize,
}

#[async_trait]
impl MetadataHandler for FakeTranscoder {
    fn name(&self) -> &'static str {
        "fake-transcoder"
    }

    async fn describe(
        &self,
        _object: &CatalogObject,
        _index: usize,
        _resource: &Resource,
    ) -> Result<ResourceInfo, HandlerError> {
        Ok(ResourceInfo {
            mime_type: "audio/mpeg".to_string(),
            size: None,
            seekable: false,
        })
    }

    async fn open(
        &self,
        _object: &CatalogObject,
        _index: usize,
        _resource: &Resource,
        range: Option<ByteRange>,
    ) -> Result<ResourceStream, HandlerError> {
        if range.is_some() {
            return Err(HandlerError::Unsupported("range on transcoded stream".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(&b"transcoded"[..]))
    }
}

struct Fixture {
    _dir: TempDir,
    catalog: Arc<MemoryCatalog>,
    resolver: RequestResolver,
}

/// Album 1 contenant la piste 42 (mp3, sous-titres, pochette)
async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, content: &[u8]| {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    };

    let track = write("track.mp3", b"ID3-fake-mpeg-payload");
    let subtitle = write("track.srt", b"1\n00:00:01,000 --> 00:00:02,000\nHello\n");
    let cover = write("cover.jpg", b"\xff\xd8\xff\xe0jpeg");

    let catalog = Arc::new(MemoryCatalog::new());
    catalog
        .insert(
            CatalogObject::item()
                .with_id(42)
                .with_parent_id(1)
                .with_title("Track")
                .with_location(track.clone())
                .with_resource(
                    Resource::new(ContentHandler::Default, ResourcePurpose::Content)
                        .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*"),
                )
                .with_resource(
                    Resource::new(ContentHandler::Subtitle, ResourcePurpose::Subtitle)
                        .with_attribute(ResourceAttribute::ProtocolInfo, render_protocol_info("srt"))
                        .with_attribute(ResourceAttribute::ResourceFile, subtitle)
                        .with_parameter("type", "srt"),
                )
                .with_resource(
                    Resource::new(ContentHandler::FanArt, ResourcePurpose::Thumbnail)
                        .with_attribute(ResourceAttribute::ProtocolInfo, render_protocol_info("jpg"))
                        .with_attribute(ResourceAttribute::ResourceFile, cover),
                ),
        )
        .await;

    catalog
        .insert(
            CatalogObject::external_url("http://radio.example/live")
                .with_id(12345)
                .with_flags(ObjectFlags::ONLINE_SERVICE | ObjectFlags::PROXY_URL)
                .with_resource(
                    Resource::new(ContentHandler::ExtUrl, ResourcePurpose::Content)
                        .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*"),
                ),
        )
        .await;

    let resolver = RequestResolver::new(catalog.clone(), MetadataService::with_file_handlers());
    Fixture {
        _dir: dir,
        catalog,
        resolver,
    }
}

async fn read_all(mut stream: ResourceStream) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn test_resolve_content_resource() {
    let f = fixture().await;

    let handle = f
        .resolver
        .resolve("/content/media/object_id/42/res_id/0/group/default/ext/file.mp3")
        .await
        .unwrap();

    assert_eq!(handle.object().id, 42);
    assert_eq!(handle.resource_index(), 0);
    assert_eq!(handle.handler_tag(), ContentHandler::Default);
    assert_eq!(handle.handler().name(), "file");

    let info = handle.describe().await.unwrap();
    assert_eq!(info.mime_type, "audio/mpeg");
    assert_eq!(info.size, Some(21));

    let body = read_all(handle.open(Some(ByteRange::new(0, Some(2)))).await.unwrap()).await;
    assert_eq!(body, b"ID3");
}

#[tokio::test]
async fn test_every_rendered_url_resolves() {
    let f = fixture().await;
    let track = f.catalog.get_object_by_id(42).await.unwrap();

    // Toutes les URLs produites par le rendu doivent revenir à la piste 42
    let didl = DidlBuilder::new("http://server/")
        .render_didl([track.as_ref()], ResourceSelection::All)
        .unwrap();
    let urls: Vec<&str> = didl
        .split('>')
        .filter_map(|chunk| chunk.strip_suffix("</res").or_else(|| chunk.strip_suffix("</sec:CaptionInfoEx")))
        .chain(didl.split('>').filter_map(|chunk| chunk.strip_suffix("</upnp:albumArtURI")))
        .collect();
    assert_eq!(urls.len(), 4);

    for url in urls {
        let handle = f.resolver.resolve(url).await.unwrap();
        assert_eq!(handle.object().id, 42, "{}", url);
        assert_eq!(
            handle.resource().purpose,
            track.resources[handle.resource_index()].purpose
        );
        assert!(handle.describe().await.unwrap().size.is_some());
    }
}

#[tokio::test]
async fn test_subtitle_is_served_by_its_handler() {
    let f = fixture().await;

    let path = "content/media/object_id/42/res_id/1/type/srt/ext/file.subtitle.srt";
    let info = f.resolver.get_info(path).await.unwrap();
    assert_eq!(info.mime_type, "srt");

    let body = read_all(f.resolver.open(path, None).await.unwrap()).await;
    assert!(body.ends_with(b"Hello\n"));
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let f = fixture().await;
    let path = "content/media/object_id/42/res_id/2";

    let first = f.resolver.resolve(path).await.unwrap();
    let second = f.resolver.resolve(path).await.unwrap();

    assert_eq!(first.locator(), second.locator());
    assert_eq!(first.resource(), second.resource());
    assert_eq!(first.handler_tag(), second.handler_tag());
    assert_eq!(f.catalog.len().await, 2);
}

#[tokio::test]
async fn test_transcoded_locator_selects_transcode_handler() {
    let f = fixture().await;
    let track = f.catalog.get_object_by_id(42).await.unwrap();
    let profile = TranscodingProfile {
        name: "mp32wav".to_string(),
        source_mimes: vec!["audio/mpeg".to_string()],
        target_mime: "audio/wav".to_string(),
        dlna_profile: None,
        first_resource: false,
    };
    let path = ResourceLocator::transcoded(42, 0, &track.resources[0], &profile).encode_path();

    let err = f.resolver.resolve(&path).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoHandler(ContentHandler::Transcode)));
    assert_eq!(err.status_code(), 501);

    let transcoder = Arc::new(FakeTranscoder::default());
    f.resolver
        .metadata_service()
        .register(ContentHandler::Transcode, transcoder.clone());

    let handle = f.resolver.resolve(&path).await.unwrap();
    assert_eq!(handle.handler_tag(), ContentHandler::Transcode);
    assert_eq!(read_all(handle.open(None).await.unwrap()).await, b"transcoded");
    assert_eq!(transcoder.opened.load(Ordering::SeqCst), 1);

    let Err(err) = handle.open(Some(ByteRange::from_offset(4))).await else {
        panic!("range request on a transcoded stream should fail");
    };
    assert!(matches!(err, ResolveError::Handler(HandlerError::Unsupported(_))));
}

#[tokio::test]
async fn test_online_item_without_handler() {
    let f = fixture().await;

    let err = f
        .resolver
        .resolve("content/online/object_id/12345/res_id/0")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::NoHandler(ContentHandler::ExtUrl)));
}

#[tokio::test]
async fn test_resolution_errors() {
    let f = fixture().await;

    let err = f.resolver.resolve("content/media/res_id/0").await.unwrap_err();
    assert!(matches!(err, ResolveError::MalformedLocator(_)));
    assert_eq!(err.status_code(), 400);

    let err = f
        .resolver
        .resolve("content/media/object_id/999/res_id/0")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::ObjectNotFound(999)));
    assert_eq!(err.status_code(), 404);

    let err = f
        .resolver
        .resolve("content/media/object_id/42/res_id/3")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::ResourceIndexOutOfRange {
            object_id: 42,
            index: 3,
            count: 3
        }
    ));
    assert_eq!(err.status_code(), 404);

    let Err(err) = f
        .resolver
        .open(
            "content/media/object_id/42/res_id/0",
            Some(ByteRange::new(10, Some(2))),
        )
        .await
    else {
        panic!("inverted range should be refused");
    };
    assert_eq!(err.status_code(), 416);
}

#[tokio::test]
async fn test_catalog_backend_failure() {
    let resolver = RequestResolver::new(Arc::new(BrokenCatalog), MetadataService::with_file_handlers());

    let err = resolver
        .resolve("content/media/object_id/1/res_id/0")
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Catalog(ref msg) if msg.contains("locked")));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let f = fixture().await;
    f.catalog
        .insert(
            CatalogObject::item().with_id(7).with_resource(
                Resource::new(ContentHandler::Flac, ResourcePurpose::Content)
                    .with_attribute(ResourceAttribute::ResourceFile, "/nonexistent/path/a.flac"),
            ),
        )
        .await;

    let err = f
        .resolver
        .get_info("content/media/object_id/7/res_id/0")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_range_past_end_is_unsatisfiable() {
    let f = fixture().await;

    let Err(err) = f
        .resolver
        .open(
            "content/media/object_id/42/res_id/0",
            Some(ByteRange::from_offset(21)),
        )
        .await
    else {
        panic!("range starting at end of file should be refused");
    };
    assert!(matches!(err, ResolveError::Handler(HandlerError::InvalidRange { start: 21, .. })));
    assert_eq!(err.status_code(), 416);
}

#[tokio::test]
async fn test_missing_source_names_the_requested_resource() {
    let f = fixture().await;
    let bare = Resource::new(ContentHandler::Default, ResourcePurpose::Content);
    f.catalog
        .insert(
            CatalogObject::container()
                .with_id(8)
                .with_resource(bare.clone())
                .with_resource(bare),
        )
        .await;

    let handle = f
        .resolver
        .resolve("content/media/object_id/8/res_id/1")
        .await
        .unwrap();
    assert_eq!(handle.resource_index(), 1);

    let err = handle.describe().await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Handler(HandlerError::MissingSource {
            object_id: 8,
            index: 1
        })
    ));
    assert_eq!(err.status_code(), 404);
}
