//! Taxonomic group canonicalisation.
//!
//! Upstream sources label groups inconsistently ("Aves", "aves", "birds",
//! "Peixes"). The public catalog only understands its iconic taxa names, so
//! every group label is mapped onto those when it can be.

/// Iconic taxon → accepted aliases (lowercase).
const ICONIC_TAXA: &[(&str, &[&str])] = &[
    ("Plantae",        &["plantae", "plant", "plants", "planta", "plantas", "flora"]),
    ("Aves",           &["aves", "bird", "birds", "ave"]),
    ("Mammalia",       &["mammalia", "mammal", "mammals", "mamífero", "mamíferos", "mamiferos"]),
    ("Reptilia",       &["reptilia", "reptile", "reptiles", "réptil", "répteis", "repteis"]),
    ("Amphibia",       &["amphibia", "amphibian", "amphibians", "anfíbio", "anfíbios", "anfibios"]),
    ("Actinopterygii", &["actinopterygii", "fish", "fishes", "ray-finned fishes", "peixe", "peixes"]),
    ("Insecta",        &["insecta", "insect", "insects", "inseto", "insetos"]),
    ("Arachnida",      &["arachnida", "arachnid", "arachnids", "spiders", "aracnídeo", "aracnídeos"]),
    ("Mollusca",       &["mollusca", "mollusc", "molluscs", "mollusks", "molusco", "moluscos"]),
    ("Fungi",          &["fungi", "fungus", "mushrooms", "fungo", "fungos"]),
];

/// Map a label onto its iconic taxon name. Case-insensitive.
pub fn iconic_taxon(label: &str) -> Option<&'static str> {
    let needle = label.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    ICONIC_TAXA
        .iter()
        .find(|(_, aliases)| aliases.contains(&needle.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// Canonical form of a group label. Unknown labels pass through trimmed.
///
/// Idempotent: `canonical_group(canonical_group(x)) == canonical_group(x)`.
pub fn canonical_group(label: &str) -> String {
    match iconic_taxon(label) {
        Some(canonical) => canonical.to_string(),
        None => label.trim().to_string(),
    }
}
