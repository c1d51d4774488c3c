use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A SECOP II procurement process as returned by the open-data API.
///
/// Only the fields the pipeline reads are typed; everything else is kept in
/// `extra` and written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id_del_proceso: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub entidad: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub departamento_entidad: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub ciudad_entidad: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub nombre_del_procedimiento: Option<String>,
    /// Free-text description, the field keywords are matched against
    #[serde(
        rename = "descripci_n_del_procedimiento",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub fase: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub estado_del_procedimiento: Option<String>,
    /// ISO-8601 publication date
    #[serde(
        rename = "fecha_de_publicacion_del",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub publication_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "compact_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub precio_base: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub duracion: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub unidad_de_duracion: Option<String>,
    #[serde(default, deserialize_with = "lenient_url", skip_serializing_if = "Option::is_none")]
    pub urlproceso: Option<ProcessUrl>,
    /// Upstream fields the pipeline does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Description text, empty when the upstream omitted it
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Publication date, empty when the upstream omitted it
    pub fn publication_date_text(&self) -> &str {
        self.publication_date.as_deref().unwrap_or("")
    }

    pub fn process_url(&self) -> Option<&str> {
        self.urlproceso
            .as_ref()
            .map(|u| u.url.as_str())
            .filter(|u| !u.is_empty())
    }
}

/// Link to the process page on the SECOP II portal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessUrl {
    #[serde(default)]
    pub url: String,
}

/// A record that matched at least one vocabulary term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: Record,
    /// Matched vocabulary terms, in vocabulary order. Never empty.
    pub matched_keywords: Vec<String>,
}

/// Accept strings, numbers and booleans; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// `urlproceso` is normally `{"url": "..."}` but older rows carry a bare
/// string or a null `url`. Any other shape reads as absent.
fn lenient_url<'de, D>(deserializer: D) -> Result<Option<ProcessUrl>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(url)) => Some(ProcessUrl { url }),
        Some(Value::Object(map)) => match map.get("url") {
            Some(Value::String(url)) => Some(ProcessUrl { url: url.clone() }),
            _ => None,
        },
        _ => None,
    })
}

/// Socrata emits numeric columns either as numbers or as numeric strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Whole amounts serialize as integers so prices round-trip without a `.0`
fn compact_number<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => serializer.serialize_i64(*v as i64),
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_reads_known_fields_and_keeps_the_rest() {
        let value = json!({
            "id_del_proceso": "CO1.REQ.123",
            "descripci_n_del_procedimiento": "Construcción de PTAR",
            "fecha_de_publicacion_del": "2024-03-01T00:00:00.000",
            "precio_base": "1500000000",
            "urlproceso": { "url": "https://community.secop.gov.co/x" },
            "modalidad_de_contratacion": "Licitación pública"
        });

        let record: Record = serde_json::from_value(value).unwrap();
        assert_eq!(record.id_del_proceso.as_deref(), Some("CO1.REQ.123"));
        assert_eq!(record.description_text(), "Construcción de PTAR");
        assert_eq!(record.precio_base, Some(1_500_000_000.0));
        assert_eq!(record.process_url(), Some("https://community.secop.gov.co/x"));
        assert_eq!(
            record.extra.get("modalidad_de_contratacion"),
            Some(&json!("Licitación pública"))
        );
    }

    #[test]
    fn test_missing_fields_are_not_errors() {
        let record: Record = serde_json::from_value(json!({})).unwrap();
        assert_eq!(record.description_text(), "");
        assert_eq!(record.publication_date_text(), "");
        assert_eq!(record.process_url(), None);
    }

    #[test]
    fn test_numeric_duration_is_read_as_text() {
        let record: Record = serde_json::from_value(json!({ "duracion": 12 })).unwrap();
        assert_eq!(record.duracion.as_deref(), Some("12"));
    }

    #[test]
    fn test_process_url_shapes() {
        let shapes = vec![
            (json!({ "url": "https://y" }), Some("https://y")),
            (json!("https://x"), Some("https://x")),
            (json!({ "url": null }), None),
            (json!({}), None),
            (json!(null), None),
            (json!(17), None),
            (json!(["https://z"]), None),
        ];

        for (urlproceso, expected) in shapes {
            let record: Record = serde_json::from_value(json!({
                "descripci_n_del_procedimiento": "Obras de alcantarillado",
                "urlproceso": urlproceso
            }))
            .unwrap();
            assert_eq!(record.process_url(), expected);
            assert_eq!(record.description_text(), "Obras de alcantarillado");
        }
    }

    #[test]
    fn test_annotated_record_serializes_flat() {
        let record = Record {
            id_del_proceso: Some("CO1.REQ.9".to_string()),
            precio_base: Some(600_000_000.0),
            ..Default::default()
        };
        let annotated = AnnotatedRecord {
            record,
            matched_keywords: vec!["bombeo".to_string()],
        };

        let value = serde_json::to_value(&annotated).unwrap();
        assert_eq!(
            value,
            json!({
                "id_del_proceso": "CO1.REQ.9",
                "precio_base": 600000000,
                "matched_keywords": ["bombeo"]
            })
        );
    }
}
