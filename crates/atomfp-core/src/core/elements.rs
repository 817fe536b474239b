use phf::{Map, phf_map};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("Unknown element symbol: '{0}'")]
    UnknownSymbol(String),

    #[error("Unknown atomic number: {0}")]
    UnknownNumber(u8),

    #[error("Property '{property}' is not tabulated for element '{symbol}'")]
    MissingProperty {
        symbol: &'static str,
        property: &'static str,
    },
}

/// A typed physical property of an element.
///
/// This is the closed set of per-atom-type scalars the fingerprint generator
/// can weight a connectivity matrix with. Requesting a property that is not
/// tabulated for an element fails with [`ElementError::MissingProperty`]
/// rather than defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementProperty {
    /// Standard atomic weight in unified atomic mass units.
    AtomicWeight,
    /// Pauling electronegativity (dimensionless). Undefined for some noble gases.
    Electronegativity,
    /// Van der Waals radius in Angstroms. Not tabulated for every transition metal.
    VdwRadius,
}

impl ElementProperty {
    pub fn label(&self) -> &'static str {
        match self {
            ElementProperty::AtomicWeight => "atomic_weight",
            ElementProperty::Electronegativity => "electronegativity",
            ElementProperty::VdwRadius => "vdw_radius",
        }
    }
}

/// Static per-element record.
///
/// Covalent radii follow the Cordero compilation (low-spin values for Mn, Fe,
/// Co); van der Waals radii follow Bondi/Alvarez where defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRecord {
    pub symbol: &'static str,
    pub number: u8,
    pub covalent_radius: f64,
    pub atomic_weight: f64,
    pub electronegativity: Option<f64>,
    pub vdw_radius: Option<f64>,
}

macro_rules! element {
    ($sym:literal, $z:literal, $cr:literal, $aw:literal, $en:expr, $vdw:expr) => {
        ElementRecord {
            symbol: $sym,
            number: $z,
            covalent_radius: $cr,
            atomic_weight: $aw,
            electronegativity: $en,
            vdw_radius: $vdw,
        }
    };
}

static ELEMENTS: Map<&'static str, ElementRecord> = phf_map! {
    "H"  => element!("H",   1, 0.31,   1.008, Some(2.20), Some(1.20)),
    "He" => element!("He",  2, 0.28,   4.003, None,       Some(1.40)),
    "Li" => element!("Li",  3, 1.28,   6.940, Some(0.98), Some(1.82)),
    "Be" => element!("Be",  4, 0.96,   9.012, Some(1.57), Some(1.53)),
    "B"  => element!("B",   5, 0.84,  10.810, Some(2.04), Some(1.92)),
    "C"  => element!("C",   6, 0.76,  12.011, Some(2.55), Some(1.70)),
    "N"  => element!("N",   7, 0.71,  14.007, Some(3.04), Some(1.55)),
    "O"  => element!("O",   8, 0.66,  15.999, Some(3.44), Some(1.52)),
    "F"  => element!("F",   9, 0.57,  18.998, Some(3.98), Some(1.47)),
    "Ne" => element!("Ne", 10, 0.58,  20.180, None,       Some(1.54)),
    "Na" => element!("Na", 11, 1.66,  22.990, Some(0.93), Some(2.27)),
    "Mg" => element!("Mg", 12, 1.41,  24.305, Some(1.31), Some(1.73)),
    "Al" => element!("Al", 13, 1.21,  26.982, Some(1.61), Some(1.84)),
    "Si" => element!("Si", 14, 1.11,  28.085, Some(1.90), Some(2.10)),
    "P"  => element!("P",  15, 1.07,  30.974, Some(2.19), Some(1.80)),
    "S"  => element!("S",  16, 1.05,  32.060, Some(2.58), Some(1.80)),
    "Cl" => element!("Cl", 17, 1.02,  35.450, Some(3.16), Some(1.75)),
    "Ar" => element!("Ar", 18, 1.06,  39.948, None,       Some(1.88)),
    "K"  => element!("K",  19, 2.03,  39.098, Some(0.82), Some(2.75)),
    "Ca" => element!("Ca", 20, 1.76,  40.078, Some(1.00), Some(2.31)),
    "Ti" => element!("Ti", 22, 1.60,  47.867, Some(1.54), None),
    "V"  => element!("V",  23, 1.53,  50.942, Some(1.63), None),
    "Cr" => element!("Cr", 24, 1.39,  51.996, Some(1.66), None),
    "Mn" => element!("Mn", 25, 1.39,  54.938, Some(1.55), None),
    "Fe" => element!("Fe", 26, 1.32,  55.845, Some(1.83), None),
    "Co" => element!("Co", 27, 1.26,  58.933, Some(1.88), None),
    "Ni" => element!("Ni", 28, 1.24,  58.693, Some(1.91), Some(1.63)),
    "Cu" => element!("Cu", 29, 1.32,  63.546, Some(1.90), Some(1.40)),
    "Zn" => element!("Zn", 30, 1.22,  65.380, Some(1.65), Some(1.39)),
    "Ga" => element!("Ga", 31, 1.22,  69.723, Some(1.81), Some(1.87)),
    "Ge" => element!("Ge", 32, 1.20,  72.630, Some(2.01), Some(2.11)),
    "As" => element!("As", 33, 1.19,  74.922, Some(2.18), Some(1.85)),
    "Se" => element!("Se", 34, 1.20,  78.971, Some(2.55), Some(1.90)),
    "Br" => element!("Br", 35, 1.20,  79.904, Some(2.96), Some(1.85)),
    "Kr" => element!("Kr", 36, 1.16,  83.798, Some(3.00), Some(2.02)),
    "Ru" => element!("Ru", 44, 1.46, 101.070, Some(2.20), None),
    "Rh" => element!("Rh", 45, 1.42, 102.906, Some(2.28), None),
    "Pd" => element!("Pd", 46, 1.39, 106.420, Some(2.20), Some(1.63)),
    "Ag" => element!("Ag", 47, 1.45, 107.868, Some(1.93), Some(1.72)),
    "Cd" => element!("Cd", 48, 1.44, 112.414, Some(1.69), Some(1.58)),
    "Sn" => element!("Sn", 50, 1.39, 118.710, Some(1.96), Some(2.17)),
    "Ir" => element!("Ir", 77, 1.41, 192.217, Some(2.20), None),
    "Pt" => element!("Pt", 78, 1.36, 195.084, Some(2.28), Some(1.75)),
    "Au" => element!("Au", 79, 1.36, 196.967, Some(2.54), Some(1.66)),
    "Pb" => element!("Pb", 82, 1.46, 207.200, Some(2.33), Some(2.02)),
};

static SYMBOLS_BY_NUMBER: Map<u8, &'static str> = phf_map! {
    1u8 => "H", 2u8 => "He", 3u8 => "Li", 4u8 => "Be", 5u8 => "B",
    6u8 => "C", 7u8 => "N", 8u8 => "O", 9u8 => "F", 10u8 => "Ne",
    11u8 => "Na", 12u8 => "Mg", 13u8 => "Al", 14u8 => "Si", 15u8 => "P",
    16u8 => "S", 17u8 => "Cl", 18u8 => "Ar", 19u8 => "K", 20u8 => "Ca",
    22u8 => "Ti", 23u8 => "V", 24u8 => "Cr", 25u8 => "Mn", 26u8 => "Fe",
    27u8 => "Co", 28u8 => "Ni", 29u8 => "Cu", 30u8 => "Zn", 31u8 => "Ga",
    32u8 => "Ge", 33u8 => "As", 34u8 => "Se", 35u8 => "Br", 36u8 => "Kr",
    44u8 => "Ru", 45u8 => "Rh", 46u8 => "Pd", 47u8 => "Ag", 48u8 => "Cd",
    50u8 => "Sn", 77u8 => "Ir", 78u8 => "Pt", 79u8 => "Au", 82u8 => "Pb",
};

/// Looks up the element record for a chemical symbol.
pub fn record(symbol: &str) -> Result<&'static ElementRecord, ElementError> {
    ELEMENTS
        .get(symbol)
        .ok_or_else(|| ElementError::UnknownSymbol(symbol.to_string()))
}

/// Looks up the element record for an atomic number.
pub fn record_for_number(number: u8) -> Result<&'static ElementRecord, ElementError> {
    let symbol = SYMBOLS_BY_NUMBER
        .get(&number)
        .ok_or(ElementError::UnknownNumber(number))?;
    record(symbol)
}

/// The chemical symbol for an atomic number.
pub fn symbol_for_number(number: u8) -> Result<&'static str, ElementError> {
    SYMBOLS_BY_NUMBER
        .get(&number)
        .copied()
        .ok_or(ElementError::UnknownNumber(number))
}

/// The covalent radius (Angstroms) for an atomic number.
pub fn covalent_radius(number: u8) -> Result<f64, ElementError> {
    Ok(record_for_number(number)?.covalent_radius)
}

/// A typed scalar property for an atomic number.
///
/// # Errors
///
/// Fails with [`ElementError::UnknownNumber`] for untabulated elements and
/// [`ElementError::MissingProperty`] when the property has no defined value
/// for the element. Callers must not paper over either case.
pub fn property(number: u8, property: ElementProperty) -> Result<f64, ElementError> {
    let rec = record_for_number(number)?;
    let value = match property {
        ElementProperty::AtomicWeight => Some(rec.atomic_weight),
        ElementProperty::Electronegativity => rec.electronegativity,
        ElementProperty::VdwRadius => rec.vdw_radius,
    };
    value.ok_or(ElementError::MissingProperty {
        symbol: rec.symbol,
        property: property.label(),
    })
}
