//! Renderer room object (JSON).
//!
//! The direct sound gives the object's position; every discrete reflection
//! becomes an `ereflect` entry with its coloration filter, and the late model
//! becomes `lreverb` with comma-separated per-band values. Numeric fields are
//! strings in fixed notation, with exponents padded to two digits
//! (`1.234e-02`).

use std::path::Path;

use rsao_analysis::ParameterSet;
use rsao_dsp::Sos;
use serde::Serialize;

use crate::{Error, Result};

/// Format `value` in scientific notation with `precision` mantissa digits and
/// a signed exponent of at least two digits.
pub fn format_exponent(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{value:.precision$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

fn join_exponents(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_exponent(*v, 2))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Object position, taken from the direct sound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectPosition {
    /// Azimuth in degrees.
    pub az: String,
    /// Elevation in degrees.
    pub el: String,
    /// Distance.
    pub radius: String,
}

/// Reflection direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectionPosition {
    /// Azimuth in degrees.
    pub az: String,
    /// Elevation in degrees.
    pub el: String,
    /// Reference distance.
    pub refdist: String,
}

/// One second-order section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiquadEntry {
    /// Numerator coefficient 0.
    pub b0: String,
    /// Numerator coefficient 1.
    pub b1: String,
    /// Numerator coefficient 2.
    pub b2: String,
    /// Denominator coefficient 0.
    pub a0: String,
    /// Denominator coefficient 1.
    pub a1: String,
    /// Denominator coefficient 2.
    pub a2: String,
}

impl From<&Sos> for BiquadEntry {
    fn from(sos: &Sos) -> Self {
        let [b0, b1, b2, a0, a1, a2] = sos.to_array().map(|c| format_exponent(c, 3));
        Self {
            b0,
            b1,
            b2,
            a0,
            a1,
            a2,
        }
    }
}

/// One discrete early reflection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectionEntry {
    /// Level relative to the direct sound.
    pub level: String,
    /// Delay after the direct sound in seconds.
    pub delay: String,
    /// Direction of arrival.
    pub position: ReflectionPosition,
    /// Coloration filter.
    pub biquadsos: Vec<BiquadEntry>,
}

/// Late reverberation, one comma-separated value per band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateReverbEntry {
    /// Onset after the direct sound in seconds.
    pub delay: String,
    /// Band levels relative to the direct sound.
    pub level: String,
    /// Band attack times in seconds.
    pub attacktime: String,
    /// Band amplitude decay constants per second.
    pub decayconst: String,
}

/// Reflections and reverberation of a room object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    /// Discrete reflections in arrival order.
    pub ereflect: Vec<ReflectionEntry>,
    /// Late reverberation, when estimated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lreverb: Option<LateReverbEntry>,
}

/// A renderer-readable room object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomObject {
    /// Object name.
    pub name: String,
    /// Object type understood by the renderer.
    #[serde(rename = "type")]
    pub objtype: String,
    /// Object id.
    pub id: u32,
    /// Channel index.
    pub channels: u32,
    /// Render priority.
    pub priority: u32,
    /// Object gain.
    pub level: f64,
    /// Direct-sound position.
    pub position: DirectPosition,
    /// Reflections and reverberation.
    pub room: Room,
}

impl RoomObject {
    /// Build a room object from encoder output.
    pub fn from_parameters(
        params: &ParameterSet,
        name: impl Into<String>,
        objtype: impl Into<String>,
    ) -> Result<Self> {
        let direct = params
            .direct_sound()
            .ok_or_else(|| Error::MissingParameters("direct sound".to_string()))?;

        let ereflect = params
            .reflections()
            .map(|(_, early)| ReflectionEntry {
                level: format_exponent(early.level, 3),
                delay: format_exponent(early.toa, 3),
                position: ReflectionPosition {
                    az: format!("{:.1}", early.doa.azimuth),
                    el: format!("{:.1}", early.doa.elevation),
                    refdist: "1.0".to_string(),
                },
                biquadsos: early.filter_sections.iter().map(BiquadEntry::from).collect(),
            })
            .collect();

        let lreverb = params.late().map(|late| LateReverbEntry {
            delay: format_exponent(late.toa, 3),
            level: join_exponents(&late.level),
            attacktime: join_exponents(&late.attacktimes),
            decayconst: join_exponents(&late.expdecays),
        });

        Ok(Self {
            name: name.into(),
            objtype: objtype.into(),
            id: 0,
            channels: 0,
            priority: 0,
            level: 1.0,
            position: DirectPosition {
                az: format!("{:.2}", direct.doa.azimuth),
                el: format!("{:.2}", direct.doa.elevation),
                radius: "1.00".to_string(),
            },
            room: Room { ereflect, lreverb },
        })
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Write a room object as JSON.
pub fn write_room_object(path: impl AsRef<Path>, object: &RoomObject) -> Result<()> {
    let path = path.as_ref();
    let json = object.to_json()?;
    std::fs::write(path, json).map_err(|e| Error::write_file(path, e))?;
    tracing::info!(
        path = %path.display(),
        reflections = object.room.ereflect.len(),
        "wrote room object"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsao_analysis::{Doa, EarlyParameters, LateParameters, ReflectionLabel};
    use std::collections::BTreeMap;

    fn early(toa: f64, level: f64, azimuth: f64, elevation: f64) -> EarlyParameters {
        EarlyParameters {
            toa,
            onset_samples: 0,
            level,
            doa: Doa { azimuth, elevation },
            window_samples: 128,
            filter_sections: vec![Sos::new(0.5, 0.0, 0.0, 1.0, -0.25, 0.0625)],
        }
    }

    fn parameters(with_late: bool) -> ParameterSet {
        let mut map = BTreeMap::new();
        map.insert(ReflectionLabel::DirectSound, early(0.0, 0.8, 12.0, -3.0));
        map.insert(ReflectionLabel::Reflection(1), early(0.0045, 0.5, 90.0, 0.0));
        map.insert(ReflectionLabel::Reflection(2), early(0.012, 0.0123, 271.0, 45.0));
        let late = with_late.then(|| LateParameters {
            toa: 0.0104,
            onset_samples: 3000.0,
            window_samples: 40000,
            bandcut: vec![500.0, 1000.0],
            level: vec![0.03, 0.025],
            expdecays: vec![-12.5, -20.5],
            attacktimes: vec![0.05, 0.05],
            reverb_times: vec![0.55, 0.34],
            refattackramplength: 2400,
        });
        ParameterSet::new(map, late)
    }

    #[test]
    fn test_format_exponent() {
        assert_eq!(format_exponent(0.01234, 3), "1.234e-02");
        assert_eq!(format_exponent(-1.0, 3), "-1.000e+00");
        assert_eq!(format_exponent(123456.0, 2), "1.23e+05");
        assert_eq!(format_exponent(0.0, 3), "0.000e+00");
        assert_eq!(format_exponent(1e-120, 1), "1.0e-120");
        assert_eq!(format_exponent(f64::NAN, 3), "nan");
        assert_eq!(format_exponent(f64::NEG_INFINITY, 3), "-inf");
    }

    #[test]
    fn test_object_layout() {
        let object = RoomObject::from_parameters(&parameters(true), "hall", "extent").unwrap();
        let json: serde_json::Value = serde_json::from_str(&object.to_json().unwrap()).unwrap();

        assert_eq!(json["name"], "hall");
        assert_eq!(json["type"], "extent");
        assert_eq!(json["id"], 0);
        assert_eq!(json["level"], 1.0);
        assert_eq!(json["position"]["az"], "12.00");
        assert_eq!(json["position"]["el"], "-3.00");
        assert_eq!(json["position"]["radius"], "1.00");

        let reflections = json["room"]["ereflect"].as_array().unwrap();
        assert_eq!(reflections.len(), 2);
        assert_eq!(reflections[0]["delay"], "4.500e-03");
        assert_eq!(reflections[0]["level"], "5.000e-01");
        assert_eq!(reflections[1]["position"]["az"], "271.0");
        assert_eq!(reflections[1]["position"]["refdist"], "1.0");
        assert_eq!(reflections[1]["biquadsos"][0]["b0"], "5.000e-01");
        assert_eq!(reflections[1]["biquadsos"][0]["a2"], "6.250e-02");

        let late = &json["room"]["lreverb"];
        assert_eq!(late["delay"], "1.040e-02");
        assert_eq!(late["level"], "3.00e-02, 2.50e-02");
        assert_eq!(late["decayconst"], "-1.25e+01, -2.05e+01");
        assert_eq!(late["attacktime"], "5.00e-02, 5.00e-02");
    }

    #[test]
    fn test_object_without_late() {
        let object = RoomObject::from_parameters(&parameters(false), "hall", "extent").unwrap();
        assert!(object.room.lreverb.is_none());
        assert!(!object.to_json().unwrap().contains("lreverb"));
    }

    #[test]
    fn test_requires_direct_sound() {
        let empty = ParameterSet::new(BTreeMap::new(), None);
        let err = RoomObject::from_parameters(&empty, "hall", "extent").unwrap_err();
        assert!(matches!(err, Error::MissingParameters(_)));
    }
}
