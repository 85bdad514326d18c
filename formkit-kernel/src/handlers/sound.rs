//! `sound` - play a sound as `name[:volume[:pitch]]`.

use anyhow::Context;
use formkit_api::{IdentityRef, SoundPlayerRef};

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct SoundHandler {
    sounds: SoundPlayerRef,
}

impl SoundHandler {
    pub fn new(sounds: SoundPlayerRef) -> Self {
        Self { sounds }
    }
}

struct SoundSpec {
    name: String,
    volume: f32,
    pitch: f32,
}

fn parse_spec(text: &str) -> anyhow::Result<SoundSpec> {
    let mut parts = text.trim().split(':');
    let name = parts.next().unwrap_or_default().trim().to_string();
    anyhow::ensure!(!name.is_empty(), "sound name is empty");
    let volume = match parts.next() {
        Some(v) => v.trim().parse().with_context(|| format!("invalid volume '{v}'"))?,
        None => 1.0,
    };
    let pitch = match parts.next() {
        Some(p) => p.trim().parse().with_context(|| format!("invalid pitch '{p}'"))?,
        None => 1.0,
    };
    Ok(SoundSpec {
        name,
        volume,
        pitch,
    })
}

impl ActionHandler for SoundHandler {
    fn action_type(&self) -> &str {
        "sound"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let specs = cx.operands(identity, value);
        if specs.is_empty() {
            return Ok(ActionResult::failure("No sound specified"));
        }
        for spec in &specs {
            let spec = parse_spec(spec)?;
            if !self.sounds.exists(&spec.name) {
                return Ok(ActionResult::failure(format!("Unknown sound: {}", spec.name)));
            }
            self.sounds
                .play(identity, &spec.name, spec.volume, spec.pitch)?;
        }
        Ok(ActionResult::success())
    }

    fn validate(&self, value: &ActionValue) -> bool {
        let body = value.body();
        !body.operands.is_empty()
            && body
                .operands
                .iter()
                // Placeholders may stand in for numbers until render time.
                .all(|op| op.contains('$') || op.contains('{') || parse_spec(op).is_ok())
    }

    fn describe(&self) -> &str {
        "Plays a sound to the identity with optional volume and pitch"
    }

    fn usage_examples(&self) -> &[&str] {
        &[
            "sound { ui.button.click }",
            "sound { entity.experience_orb.pickup:1.0:1.2 }",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{MockIdentity, MockSounds, TestExecutor};
    use std::sync::Arc;

    #[test]
    fn test_sound_parses_volume_and_pitch() {
        let sounds = Arc::new(MockSounds::default());
        let handler = SoundHandler::new(sounds.clone());
        let harness = TestExecutor::new();
        let cx = harness.context_with(&[]);
        let result = handler
            .execute(
                &MockIdentity::new("Steve").into_ref(),
                &ActionValue::from("sound { random.levelup:0.5:2 }"),
                &harness.handler_context(&cx),
            )
            .unwrap();
        assert!(result.is_success());
        assert_eq!(sounds.played(), vec![("random.levelup".to_string(), 0.5, 2.0)]);
    }

    #[test]
    fn test_sound_validate() {
        let handler = SoundHandler::new(Arc::new(MockSounds::default()));
        assert!(handler.validate(&ActionValue::from("sound { a.b }")));
        assert!(handler.validate(&ActionValue::from("sound { a.b:$vol }")));
        assert!(!handler.validate(&ActionValue::from("sound { a.b:loud }")));
    }

    #[test]
    fn test_sound_bad_volume_is_error() {
        assert!(parse_spec("x:loud").is_err());
        assert!(parse_spec(":1").is_err());
    }
}
