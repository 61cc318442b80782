//! Translation between the simplified MQTT control schema and CLIP v2
//! command bodies.

use serde::Deserialize;

use crate::bridge::CommandLight;
use crate::Result;

/// One control message as published on `{prefix}/{kind}/{selector}`. Every
/// field is optional; fields outside this set are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlPayload {
    /// `"ON"` or `"OFF"`; any other value is ignored.
    pub state: Option<String>,
    /// 0-254, the zigbee-style range most MQTT lighting setups publish.
    pub brightness: Option<f32>,
    pub color: Option<ControlColor>,
    /// Color temperature in mirek, 153-500.
    pub color_temp: Option<u16>,
}

/// CIE xy coordinates, both required for the color to be applied.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ControlColor {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl ControlPayload {
    /// Maps each present field to its CLIP v2 counterpart. Brightness is
    /// rescaled linearly from 0-254 to the bridge's 0-100.
    pub fn to_command(&self) -> CommandLight {
        let mut command = CommandLight::default();
        match self.state.as_deref() {
            Some("ON") => command = command.on(),
            Some("OFF") => command = command.off(),
            _ => {}
        }
        if let Some(brightness) = self.brightness {
            command = command.with_brightness(brightness * 100.0 / 254.0);
        }
        if let Some(color) = &self.color {
            if let (Some(x), Some(y)) = (color.x, color.y) {
                command = command.with_xy(x, y);
            }
        }
        if let Some(mirek) = self.color_temp {
            command = command.with_mirek(mirek);
        }
        command
    }
}

/// Parses raw message bytes into a control payload and maps it to a
/// command. An unparseable body is a translation error; the caller drops
/// the message without touching the bridge.
pub fn translate(payload: &[u8]) -> Result<CommandLight> {
    let parsed: ControlPayload = serde_json::from_slice(payload)?;
    Ok(parsed.to_command())
}

/// Parses raw message bytes that already use the CLIP v2 command schema,
/// as published on `{prefix}/resource/{kind}/{id}/set`.
pub fn parse_native(payload: &[u8]) -> Result<CommandLight> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::On;

    #[test]
    fn empty_payload_translates_to_empty_command() {
        let command = translate(b"{}").unwrap();
        assert_eq!(command, CommandLight::default());
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn state_maps_to_on() {
        let command = translate(br#"{"state":"ON"}"#).unwrap();
        assert_eq!(command.on, Some(On { on: true }));
        assert!(command.dimming.is_none());

        let command = translate(br#"{"state":"OFF"}"#).unwrap();
        assert_eq!(command.on, Some(On { on: false }));
    }

    #[test]
    fn unknown_state_value_is_ignored() {
        let command = translate(br#"{"state":"TOGGLE"}"#).unwrap();
        assert!(command.on.is_none());
    }

    #[test]
    fn brightness_rescale_is_linear_and_exact_at_endpoints() {
        let at = |raw: f32| {
            translate(format!(r#"{{"brightness":{raw}}}"#).as_bytes())
                .unwrap()
                .dimming
                .unwrap()
                .brightness
        };
        assert_eq!(at(254.0), 100.0);
        assert_eq!(at(0.0), 0.0);
        assert!((at(127.0) - 50.0).abs() < 0.1);
    }

    #[test]
    fn color_requires_both_coordinates() {
        let command = translate(br#"{"color":{"x":0.3,"y":0.4}}"#).unwrap();
        let xy = command.color.unwrap().xy;
        assert_eq!(xy.x, 0.3);
        assert_eq!(xy.y, 0.4);

        let command = translate(br#"{"color":{"x":0.3}}"#).unwrap();
        assert!(command.color.is_none());
    }

    #[test]
    fn color_temp_passes_through() {
        let command = translate(br#"{"color_temp":320}"#).unwrap();
        assert_eq!(command.color_temperature.unwrap().mirek, 320);
    }

    #[test]
    fn unrecognized_fields_are_ignored() {
        let command = translate(br#"{"state":"ON","effect":"prism"}"#).unwrap();
        assert_eq!(command.on, Some(On { on: true }));
    }

    #[test]
    fn malformed_body_is_a_translation_error() {
        assert!(translate(b"not json").is_err());
        assert!(translate(b"").is_err());
    }

    #[test]
    fn native_body_parses_clip_schema() {
        let command = parse_native(br#"{"on":{"on":true},"dimming":{"brightness":40.0}}"#).unwrap();
        assert_eq!(command.on, Some(On { on: true }));
        assert_eq!(command.dimming.unwrap().brightness, 40.0);
    }
}
