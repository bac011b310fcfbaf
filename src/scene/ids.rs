//! OME-style identifiers for scenes and channels.

const IMAGE_ID_PREFIX: &str = "Image:";

/// Generate the OME image id for a scene index, e.g. `Image:0`.
pub fn generate_ome_image_id(index: usize) -> String {
    format!("{IMAGE_ID_PREFIX}{index}")
}

/// Generate the OME channel id for a channel of an image.
///
/// The image id's `Image:` prefix is stripped, so the first channel of
/// `Image:0` becomes `Channel:0:0`.
pub fn generate_ome_channel_id(image_id: &str, channel: usize) -> String {
    let image_index = image_id.strip_prefix(IMAGE_ID_PREFIX).unwrap_or(image_id);
    format!("Channel:{image_index}:{channel}")
}
