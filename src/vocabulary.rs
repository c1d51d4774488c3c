/// Water, wastewater and pumping infrastructure terms a process description is
/// matched against. Order matters: matched terms are reported in this order.
pub const DEFAULT_TERMS: &[&str] = &[
    "bombeo",
    "estaciones de bombeo",
    "ampliación de capacidad",
    "optimización de sistemas",
    "sectorización de acueductos",
    "motobombas",
    "equipos electromecánicos",
    "bombas flotantes",
    "control de inundaciones",
    "construcción electromecánica",
    "variadores de velocidad",
    "desarenadores",
    "rejillas de cribado",
    "estaciones elevadoras",
    "tanques de almacenamiento",
    "tratamiento de lixiviados",
    "tubería de impulsión",
    "control de aguas lluvias",
    "control de aguas residuales",
    "mantenimiento de equipos eléctricos",
    "operación de sistemas de tratamiento",
    "agua residual",
    "agua potable",
    "agua industrial",
    "bombeo en lagunas",
    "automatización de plantas",
    "PTAR",
    "PTAP",
    "mantenimiento electromecánico",
    "regulación de aguas lluvias",
    "paneles solares hidráulicos",
    "almacenamiento de agua",
    "bombas sumergibles",
    "red matriz",
    "red troncal",
    "conexiones domiciliarias",
    "ampliación de redes de acueducto",
    "alcantarillado",
    "sumideros",
    "sistemas de válvulas",
    "medición de caudal",
    "medición de presión",
    "calidad de agua",
    "telemetría",
    "plantas de tratamiento de agua potable",
    "plantas de tratamiento de agua residual",
    "pozos profundos",
    "diseño de desarenadores",
    "distribución de agua",
];

/// An ordered, immutable keyword list.
///
/// Terms are lower-cased once on construction so matching a record only
/// lower-cases the description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    original: String,
    folded: String,
}

impl Vocabulary {
    /// Build a vocabulary from terms in the order they should be reported.
    /// Blank terms are dropped; they would match every description.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms = terms
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.trim().is_empty())
            .map(|original| Term {
                folded: original.to_lowercase(),
                original,
            })
            .collect();
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms as configured, in vocabulary order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.original.as_str())
    }

    /// `(original, lower-cased)` pairs in vocabulary order
    pub(crate) fn folded_terms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms
            .iter()
            .map(|t| (t.original.as_str(), t.folded.as_str()))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_TERMS.iter().copied())
    }
}
