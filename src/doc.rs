//! Read/write helpers over the structured document format.
//!
//! Every reader returns `Option` and leaves the caller's state untouched on
//! a missing or type-mismatched node; the serializer relies on that to keep
//! loads best-effort.

use glam::Vec3;
use serde_json::{Map, Number, Value};

/// Keyed object node of a document.
pub type DocObject = Map<String, Value>;

pub fn read_bool(doc: &DocObject, key: &str) -> Option<bool> {
    doc.get(key)?.as_bool()
}

pub fn read_int32(doc: &DocObject, key: &str) -> Option<i32> {
    doc.get(key)?.as_i64().map(|value| value as i32)
}

pub fn read_float(doc: &DocObject, key: &str) -> Option<f32> {
    doc.get(key)?.as_f64().map(|value| value as f32)
}

pub fn read_string(doc: &DocObject, key: &str) -> Option<String> {
    doc.get(key)?.as_str().map(str::to_string)
}

pub fn read_vec3(doc: &DocObject, key: &str) -> Option<Vec3> {
    let components = read_float_seq::<3>(doc.get(key)?)?;
    Some(Vec3::from_array(components))
}

pub fn read_vec4(doc: &DocObject, key: &str) -> Option<[f32; 4]> {
    read_float_seq::<4>(doc.get(key)?)
}

pub fn read_array<'a>(doc: &'a DocObject, key: &str) -> Option<&'a Vec<Value>> {
    doc.get(key)?.as_array()
}

pub fn read_object<'a>(doc: &'a DocObject, key: &str) -> Option<&'a DocObject> {
    doc.get(key)?.as_object()
}

fn read_float_seq<const N: usize>(node: &Value) -> Option<[f32; N]> {
    let items = node.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut values = [0.0f32; N];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = item.as_f64()? as f32;
    }
    Some(values)
}

/// Encodes a float, falling back to null for non-finite values the document
/// format cannot carry.
pub fn float_value(value: f32) -> Value {
    Number::from_f64(f64::from(value))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub fn vec3_value(value: Vec3) -> Value {
    Value::Array(vec![
        float_value(value.x),
        float_value(value.y),
        float_value(value.z),
    ])
}

pub fn vec4_value(values: [f32; 4]) -> Value {
    Value::Array(values.iter().map(|v| float_value(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> DocObject {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn scalar_readers_reject_mismatched_nodes() {
        let doc = doc(json!({
            "Flag": true,
            "Count": 3,
            "Speed": 2.5,
            "Label": "hello",
        }));
        assert_eq!(read_bool(&doc, "Flag"), Some(true));
        assert_eq!(read_int32(&doc, "Count"), Some(3));
        assert_eq!(read_float(&doc, "Speed"), Some(2.5));
        assert_eq!(read_string(&doc, "Label"), Some("hello".to_string()));

        assert_eq!(read_bool(&doc, "Count"), None);
        assert_eq!(read_int32(&doc, "Speed"), None);
        assert_eq!(read_string(&doc, "Flag"), None);
        assert_eq!(read_float(&doc, "Missing"), None);
    }

    #[test]
    fn float_reader_accepts_integral_nodes() {
        let doc = doc(json!({ "Speed": 4 }));
        assert_eq!(read_float(&doc, "Speed"), Some(4.0));
    }

    #[test]
    fn sequence_readers_require_exact_length() {
        let doc = doc(json!({
            "Position": [1.0, 2.0, 3.0],
            "Short": [1.0, 2.0],
            "Mixed": [1.0, "x", 3.0],
            "Tint": [0.1, 0.2, 0.3, 0.4],
        }));
        assert_eq!(read_vec3(&doc, "Position"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(read_vec3(&doc, "Short"), None);
        assert_eq!(read_vec3(&doc, "Mixed"), None);
        assert_eq!(read_vec4(&doc, "Tint"), Some([0.1, 0.2, 0.3, 0.4]));
        assert_eq!(read_vec4(&doc, "Position"), None);
    }

    #[test]
    fn writers_round_trip_through_readers() {
        let mut doc = DocObject::new();
        doc.insert("Position".to_string(), vec3_value(Vec3::new(1.0, -2.0, 0.5)));
        doc.insert("Curve".to_string(), vec4_value([0.0, 0.25, 0.5, 1.0]));
        assert_eq!(read_vec3(&doc, "Position"), Some(Vec3::new(1.0, -2.0, 0.5)));
        assert_eq!(read_vec4(&doc, "Curve"), Some([0.0, 0.25, 0.5, 1.0]));
    }

    #[test]
    fn non_finite_floats_encode_as_null() {
        assert_eq!(float_value(f32::NAN), Value::Null);
        assert_eq!(float_value(1.5), json!(1.5));
    }
}
