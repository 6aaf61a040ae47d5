//! Record-to-image-descriptor transform
//!
//! [`describe`] maps one catalog record to the images that should be
//! materialized for it. This encodes the presentation rules for the handful
//! of layouts whose printed form differs from their canonical one:
//!
//! - `split` / `aftermath`: one sideways image named after both halves,
//!   hinted for a conditional 90-degree rotation;
//! - `flip`: a single image holding both faces, fanned out to two jobs —
//!   face 1 as-is, face 2 hinted to rotate 180 degrees;
//! - `adventure`: one image, named after the main (first) face;
//! - multi-face layouts without a card-level image (transform, modal DFC):
//!   one job per face that has its own image;
//! - everything else: one job named after the card.
//!
//! The transform is pure and deterministic; fetch and resume logic never
//! look inside it.

use crate::types::{CardFace, CardRecord, ImageDescriptor, Layout, RotateHint};

/// Fallback display name when a record carries no usable name at all
const UNKNOWN_NAME: &str = "Unknown";

/// Preferred display title for a whole card: flavor name, then printed
/// name, then canonical name
fn card_title(record: &CardRecord) -> String {
    record
        .flavor_name
        .as_deref()
        .or(record.printed_name.as_deref())
        .or(record.name.as_deref())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

/// Preferred display title for one face, falling back to the card title
fn face_title(face: &CardFace, record: &CardRecord) -> String {
    face.flavor_name
        .as_deref()
        .or(face.printed_name.as_deref())
        .or(face.name.as_deref())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| card_title(record))
}

/// Combined title for split-style layouts: every face's title with spaces
/// removed, concatenated ("Fire // Ice" prints as FireIce.jpg)
fn combined_face_title(record: &CardRecord) -> String {
    let combined: String = record
        .card_faces
        .iter()
        .map(|f| {
            f.flavor_name
                .as_deref()
                .or(f.printed_name.as_deref())
                .or(f.name.as_deref())
                .unwrap_or("")
                .replace(' ', "")
        })
        .collect();
    if combined.trim().is_empty() {
        card_title(record)
    } else {
        combined
    }
}

/// Expand one record into 0..N image descriptors
///
/// Records with no usable image URI anywhere produce an empty vec; the
/// manifest builder skips them.
pub fn describe(record: &CardRecord) -> Vec<ImageDescriptor> {
    let layout = Layout::parse(&record.layout);

    if let Some(uris) = &record.image_uris
        && let Some(url) = uris.best()
    {
        return match layout {
            Layout::Split | Layout::Aftermath => vec![ImageDescriptor {
                url: url.to_string(),
                display_name: combined_face_title(record),
                face_index: 1,
                rotate: RotateHint::Horizontal90,
            }],
            Layout::Adventure => {
                let name = record
                    .card_faces
                    .first()
                    .map(|f| face_title(f, record))
                    .unwrap_or_else(|| card_title(record));
                vec![ImageDescriptor {
                    url: url.to_string(),
                    display_name: name,
                    face_index: 1,
                    rotate: RotateHint::None,
                }]
            }
            Layout::Flip => {
                let f1 = record
                    .card_faces
                    .first()
                    .map(|f| face_title(f, record))
                    .unwrap_or_else(|| card_title(record));
                let f2 = record
                    .card_faces
                    .get(1)
                    .map(|f| face_title(f, record))
                    .unwrap_or_else(|| card_title(record));
                vec![
                    ImageDescriptor {
                        url: url.to_string(),
                        display_name: f1,
                        face_index: 1,
                        rotate: RotateHint::None,
                    },
                    ImageDescriptor {
                        url: url.to_string(),
                        display_name: f2,
                        face_index: 2,
                        rotate: RotateHint::Rot180,
                    },
                ]
            }
            Layout::Other => vec![ImageDescriptor {
                url: url.to_string(),
                display_name: card_title(record),
                face_index: 1,
                rotate: RotateHint::None,
            }],
        };
    }

    // No card-level image: one descriptor per face that has its own
    let mut out = Vec::new();
    for (i, face) in record.card_faces.iter().enumerate() {
        let Some(url) = face.image_uris.as_ref().and_then(|u| u.best()) else {
            continue;
        };
        out.push(ImageDescriptor {
            url: url.to_string(),
            display_name: face_title(face, record),
            face_index: (i + 1) as u32,
            rotate: RotateHint::None,
        });
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageUris;

    fn uris(url: &str) -> Option<ImageUris> {
        Some(ImageUris {
            large: Some(url.to_string()),
            ..Default::default()
        })
    }

    fn face(name: &str) -> CardFace {
        CardFace {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn normal_card_yields_one_descriptor() {
        let record = CardRecord {
            name: Some("Lightning Bolt".into()),
            layout: "normal".into(),
            image_uris: uris("https://img.example/bolt.jpg"),
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_name, "Lightning Bolt");
        assert_eq!(out[0].face_index, 1);
        assert_eq!(out[0].rotate, RotateHint::None);
    }

    #[test]
    fn split_card_combines_face_names_and_hints_h90() {
        let record = CardRecord {
            name: Some("Fire // Ice".into()),
            layout: "split".into(),
            image_uris: uris("https://img.example/fireice.jpg"),
            card_faces: vec![face("Fire"), face("Ice")],
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_name, "FireIce");
        assert_eq!(out[0].rotate, RotateHint::Horizontal90);
    }

    #[test]
    fn split_face_names_lose_internal_spaces() {
        let record = CardRecord {
            layout: "aftermath".into(),
            image_uris: uris("https://img.example/dd.jpg"),
            card_faces: vec![face("Driven"), face("Despair")],
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out[0].display_name, "DrivenDespair");
        assert_eq!(out[0].rotate, RotateHint::Horizontal90);
    }

    #[test]
    fn flip_card_yields_two_descriptors_sharing_the_url() {
        let record = CardRecord {
            name: Some("Akki Lavarunner".into()),
            layout: "flip".into(),
            image_uris: uris("https://img.example/akki.jpg"),
            card_faces: vec![face("Akki Lavarunner"), face("Tok-Tok, Volcano Born")],
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].url, out[1].url);
        assert_eq!(out[0].display_name, "Akki Lavarunner");
        assert_eq!(out[0].face_index, 1);
        assert_eq!(out[0].rotate, RotateHint::None);
        assert_eq!(out[1].display_name, "Tok-Tok, Volcano Born");
        assert_eq!(out[1].face_index, 2);
        assert_eq!(out[1].rotate, RotateHint::Rot180);
    }

    #[test]
    fn adventure_card_uses_first_face_name() {
        let record = CardRecord {
            name: Some("Brazen Borrower // Petty Theft".into()),
            layout: "adventure".into(),
            image_uris: uris("https://img.example/bb.jpg"),
            card_faces: vec![face("Brazen Borrower"), face("Petty Theft")],
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_name, "Brazen Borrower");
        assert_eq!(out[0].rotate, RotateHint::None);
    }

    #[test]
    fn transform_card_yields_one_descriptor_per_face() {
        let mut front = face("Delver of Secrets");
        front.image_uris = uris("https://img.example/front.jpg");
        let mut back = face("Insectile Aberration");
        back.image_uris = uris("https://img.example/back.jpg");

        let record = CardRecord {
            name: Some("Delver of Secrets // Insectile Aberration".into()),
            layout: "transform".into(),
            card_faces: vec![front, back],
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].display_name, "Delver of Secrets");
        assert_eq!(out[0].face_index, 1);
        assert_eq!(out[1].display_name, "Insectile Aberration");
        assert_eq!(out[1].face_index, 2);
    }

    #[test]
    fn faces_without_uris_are_skipped_but_indices_stay_positional() {
        let front = face("Front");
        let mut back = face("Back");
        back.image_uris = uris("https://img.example/back.jpg");

        let record = CardRecord {
            layout: "transform".into(),
            card_faces: vec![front, back],
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_name, "Back");
        assert_eq!(out[0].face_index, 2);
    }

    #[test]
    fn record_without_any_image_yields_nothing() {
        let record = CardRecord {
            name: Some("Cardless Wonder".into()),
            layout: "normal".into(),
            ..Default::default()
        };
        assert!(describe(&record).is_empty());
    }

    #[test]
    fn flavor_name_wins_over_printed_and_canonical() {
        let record = CardRecord {
            name: Some("Plains".into()),
            printed_name: Some("Plaine".into()),
            flavor_name: Some("Godzilla Plains".into()),
            layout: "normal".into(),
            image_uris: uris("https://img.example/p.jpg"),
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out[0].display_name, "Godzilla Plains");
    }

    #[test]
    fn nameless_record_falls_back_to_unknown() {
        let record = CardRecord {
            layout: "normal".into(),
            image_uris: uris("https://img.example/x.jpg"),
            ..Default::default()
        };
        let out = describe(&record);
        assert_eq!(out[0].display_name, "Unknown");
    }
}
