use fmcontainer::data_types::BlobPayload;
use fmcontainer::format::Format;

use crate::{make_codec, photo, JPEG_BYTES, PNG_BYTES};

#[tokio::test]
async fn test_upload_then_download_png() {
    let codec = make_codec().await;

    assert!(
        codec
            .upload(&photo(7), &BlobPayload::new(PNG_BYTES.to_vec(), "a.png"))
            .await
    );

    let reference = codec.get_reference(&photo(7)).await.unwrap();
    assert!(reference.ends_with(".png"), "{reference}");

    assert_eq!(
        codec.download(&photo(7), &Format::normalize("PNG")).await,
        Some(PNG_BYTES.to_vec())
    );
    // Same content under the native code and an alias
    assert_eq!(
        codec.download_as(&photo(7), Some("pngf")).await,
        Some(PNG_BYTES.to_vec())
    );
}

#[tokio::test]
async fn test_download_in_wrong_format_is_absent() {
    let codec = make_codec().await;
    assert!(
        codec
            .upload(&photo(3), &BlobPayload::new(JPEG_BYTES.to_vec(), "me.jpg"))
            .await
    );

    assert_eq!(codec.download(&photo(3), &Format::Png).await, None);
    assert_eq!(codec.download(&photo(3), &Format::Pdf).await, None);
    assert_eq!(codec.download(&photo(3), &Format::File).await, None);
    assert_eq!(
        codec.download(&photo(3), &Format::normalize("XXXX")).await,
        None
    );
    assert_eq!(
        codec.download(&photo(3), &Format::Jpeg).await,
        Some(JPEG_BYTES.to_vec())
    );
}

#[tokio::test]
async fn test_untyped_content_only_comes_back_as_file() {
    let codec = make_codec().await;
    let bytes = b"just some text".to_vec();
    assert!(
        codec
            .upload(&photo(4), &BlobPayload::new(bytes.clone(), "notes.txt"))
            .await
    );

    assert_eq!(codec.download(&photo(4), &Format::File).await, Some(bytes));
    assert_eq!(codec.download(&photo(4), &Format::Jpeg).await, None);
}

#[tokio::test]
async fn test_nonexistent_record() {
    let codec = make_codec().await;

    assert_eq!(codec.download(&photo(999999), &Format::Jpeg).await, None);
    assert!(
        !codec
            .upload(&photo(999999), &BlobPayload::anonymous(PNG_BYTES.to_vec()))
            .await
    );
    assert!(!codec.clear(&photo(999999)).await);
    assert_eq!(codec.get_reference(&photo(999999)).await, None);
}

#[tokio::test]
async fn test_clear() {
    let codec = make_codec().await;
    assert!(
        codec
            .upload(&photo(5), &BlobPayload::new(PNG_BYTES.to_vec(), "a.png"))
            .await
    );

    assert!(codec.clear(&photo(5)).await);
    assert_eq!(codec.download(&photo(5), &Format::Png).await, None);
    assert_eq!(codec.get_reference(&photo(5)).await, None);
    // Clearing an empty container still touches the record
    assert!(codec.clear(&photo(5)).await);
}

#[tokio::test]
async fn test_last_upload_wins() {
    let codec = make_codec().await;
    assert!(
        codec
            .upload(&photo(6), &BlobPayload::new(PNG_BYTES.to_vec(), "first.png"))
            .await
    );
    assert!(
        codec
            .upload(&photo(6), &BlobPayload::new(JPEG_BYTES.to_vec(), "second.jpg"))
            .await
    );

    assert_eq!(
        codec.get_reference(&photo(6)).await,
        Some("second.jpg".to_string())
    );
    assert_eq!(codec.download(&photo(6), &Format::Png).await, None);
}

#[tokio::test]
async fn test_unsafe_filename_is_stored_sanitized() {
    let codec = make_codec().await;
    assert!(
        codec
            .upload(
                &photo(8),
                &BlobPayload::new(PNG_BYTES.to_vec(), "x'; DROP TABLE contact; --.png")
            )
            .await
    );

    assert_eq!(
        codec.get_reference(&photo(8)).await,
        Some("x__ DROP TABLE contact_ --.png".to_string())
    );
}

#[tokio::test]
async fn test_content_type_is_written_with_content() {
    let codec = make_codec().await;
    assert!(
        codec
            .upload_with_content_type(
                &photo(9),
                &BlobPayload::new(PNG_BYTES.to_vec(), "a.png"),
                "photo_content_type",
                None,
            )
            .await
    );
    assert_eq!(
        codec.get_content_type(&photo(9), "photo_content_type").await,
        Some("image/png".to_string())
    );

    assert!(
        codec
            .clear_with_content_type(&photo(9), "photo_content_type")
            .await
    );
    assert_eq!(
        codec.get_content_type(&photo(9), "photo_content_type").await,
        None
    );
    assert_eq!(codec.get_reference(&photo(9)).await, None);
}

#[tokio::test]
async fn test_content_type_write_rolls_back() {
    let codec = make_codec().await;
    assert!(
        codec
            .upload(&photo(10), &BlobPayload::new(PNG_BYTES.to_vec(), "keep.png"))
            .await
    );

    // No such column: the content write must not survive either
    assert!(
        !codec
            .upload_with_content_type(
                &photo(10),
                &BlobPayload::new(JPEG_BYTES.to_vec(), "lost.jpg"),
                "no_such_column",
                Some("image/jpeg"),
            )
            .await
    );
    assert_eq!(
        codec.get_reference(&photo(10)).await,
        Some("keep.png".to_string())
    );
}
