//! Tests d'intégration du codec des URLs de ressources
//!
//! Chaque forme d'URL produite par le rendu doit se décoder vers le même
//! locator, et un chemin incomplet doit être refusé.

use pmodidl::{
    render_protocol_info, CatalogObject, ContentHandler, LocatorError, Resource,
    ResourceAttribute, ResourceLocator, ResourcePurpose, TranscodingProfile, VirtualRoot,
};

fn resources() -> Vec<Resource> {
    vec![
        Resource::new(ContentHandler::Default, ResourcePurpose::Content)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*"),
        Resource::new(ContentHandler::Subtitle, ResourcePurpose::Subtitle)
            .with_attribute(ResourceAttribute::ProtocolInfo, render_protocol_info("srt"))
            .with_parameter("type", "srt"),
        Resource::new(ContentHandler::FanArt, ResourcePurpose::Thumbnail)
            .with_attribute(ResourceAttribute::ProtocolInfo, render_protocol_info("jpg")),
        Resource::new(ContentHandler::Id3, ResourcePurpose::Content)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:image/png:*")
            .with_parameter("group", "embedded art"),
        Resource::new(ContentHandler::Default, ResourcePurpose::Content)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:application/x-unknown:*"),
        Resource::new(ContentHandler::Subtitle, ResourcePurpose::Subtitle)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:vtt:*")
            .with_parameter("type", ""),
        Resource::new(ContentHandler::Default, ResourcePurpose::Content)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*")
            .with_parameter("group", ""),
    ]
}

fn every_locator() -> Vec<ResourceLocator> {
    let profile = TranscodingProfile {
        name: "flac2mp3".to_string(),
        source_mimes: vec!["audio/flac".to_string()],
        target_mime: "audio/mpeg".to_string(),
        dlna_profile: None,
        first_resource: false,
    };

    let mut locators = vec![ResourceLocator::online(12345)];
    for (index, resource) in resources().iter().enumerate() {
        locators.push(ResourceLocator::album_art(42, index));
        locators.push(ResourceLocator::caption(42, index, resource));
        locators.push(ResourceLocator::content(42, index, resource));
        locators.push(ResourceLocator::transcoded(42, index, resource, &profile));
    }
    locators
}

#[test]
fn test_every_form_round_trips() {
    for locator in every_locator() {
        let path = locator.encode_path();
        let decoded = ResourceLocator::decode_path(&path)
            .unwrap_or_else(|e| panic!("{} failed to decode: {}", path, e));
        assert_eq!(decoded, locator, "{}", path);

        // L'encodage du locator décodé redonne le même chemin
        assert_eq!(decoded.encode_path(), path);
    }
}

#[test]
fn test_absolute_urls_round_trip() {
    for locator in every_locator() {
        let url = locator.to_url("http://192.168.1.20:49152/");
        let decoded: ResourceLocator = url.parse().unwrap();
        assert_eq!(decoded, locator, "{}", url);
    }
}

#[test]
fn test_content_paths_match_wire_format() {
    let resources = resources();

    assert_eq!(
        ResourceLocator::content(42, 0, &resources[0]).encode_path(),
        "content/media/object_id/42/res_id/0/group/default/ext/file.mp3"
    );
    assert_eq!(
        ResourceLocator::content(42, 3, &resources[3]).encode_path(),
        "content/media/object_id/42/res_id/3/group/embedded%20art/ext/file.png"
    );
    assert_eq!(
        ResourceLocator::content(42, 4, &resources[4]).encode_path(),
        "content/media/object_id/42/res_id/4/group/default/ext/file.x-unknown"
    );
}

#[test]
fn test_empty_parameters_fall_back() {
    let resources = resources();

    assert_eq!(
        ResourceLocator::caption(5, 5, &resources[5]).encode_path(),
        "content/media/object_id/5/res_id/5/type/vtt/ext/file.subtitle.vtt"
    );
    assert_eq!(
        ResourceLocator::content(5, 6, &resources[6]).encode_path(),
        "content/media/object_id/5/res_id/6/group/default/ext/file.mp3"
    );

    let locator = ResourceLocator::new(5, 1).with_group("").with_subtitle_type("");
    assert_eq!(locator.encode_path(), "content/media/object_id/5/res_id/1");
    assert_eq!(ResourceLocator::decode_path(&locator.encode_path()), Ok(locator));
}

#[test]
fn test_decoded_fields() {
    let locator = ResourceLocator::decode_path(
        "/content/online/object_id/7/res_id/1/group/default/type/srt/pr_name/vtt/tr/1/ext/file.subtitle.srt",
    )
    .unwrap();

    assert_eq!(locator.root, VirtualRoot::Online);
    assert_eq!(locator.object_id, 7);
    assert_eq!(locator.resource_index, 1);
    assert_eq!(locator.group.as_deref(), Some("default"));
    assert_eq!(locator.subtitle_type.as_deref(), Some("srt"));
    assert_eq!(locator.transcode_profile.as_deref(), Some("vtt"));
    assert_eq!(locator.extension.as_deref(), Some("subtitle.srt"));
    assert!(locator.is_transcoded());
}

#[test]
fn test_unknown_trailing_segments_are_ignored() {
    let locator =
        ResourceLocator::decode_path("content/media/object_id/3/res_id/0/group/default/ext/file.mp3/cover/Track%201.mp3")
            .unwrap();
    assert_eq!(
        locator,
        ResourceLocator::new(3, 0).with_group("default").with_extension("mp3")
    );
}

#[test]
fn test_missing_object_id_is_malformed() {
    assert_eq!(
        ResourceLocator::decode_path("content/media/res_id/0/group/default/ext/file.mp3"),
        Err(LocatorError::MissingSegment("object_id"))
    );
    assert!(ResourceLocator::decode_path("").is_err());
    assert!(ResourceLocator::decode_path("content/media/object_id//res_id/0").is_err());
}

#[test]
fn test_online_locator_matches_proxied_object() {
    let object = CatalogObject::external_url("http://localhost/external/url").with_id(12345);
    assert_eq!(
        ResourceLocator::online(object.id).encode_path(),
        "content/online/object_id/12345/res_id/0"
    );
}
