use indexmap::IndexMap;

/// Identifier for a registered data source (or a superset tag).
/// Examples: `coco_train`, `synthetic::boxes`, `domain_a`
pub type SourceId = String;
/// Requested output key in a sampling spec.
/// Examples: `input`, `label`, `mask`
pub type SpecKey = String;
/// Per-key descriptor handed to augmentation and sources (shape, crop, flags).
/// Example: `[1, 128, 128]`
pub type SpecValue = serde_json::Value;
/// Ordered mapping from requested output key to its descriptor.
pub type Spec = IndexMap<SpecKey, SpecValue>;
/// Keyed sample payload produced by record-backed datasets.
pub type Record<V> = IndexMap<SpecKey, V>;
