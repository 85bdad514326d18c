//! `economy` - `add|remove|set:amount`, `check[:amount]`, `pay:target:amount`.

use anyhow::Context;
use formkit_api::{EconomyRef, IdentityDirectoryRef, IdentityRef};

use super::{ActionHandler, HandlerContext};
use crate::action::{ActionResult, ActionValue};

pub struct EconomyHandler {
    economy: EconomyRef,
    directory: Option<IdentityDirectoryRef>,
}

impl EconomyHandler {
    pub fn new(economy: EconomyRef, directory: Option<IdentityDirectoryRef>) -> Self {
        Self { economy, directory }
    }

    fn run(&self, identity: &IdentityRef, spec: &str) -> anyhow::Result<ActionResult> {
        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        let operation = parts[0].to_lowercase();
        let amount = |i: usize| -> anyhow::Result<f64> {
            let raw = parts
                .get(i)
                .with_context(|| format!("economy {operation} needs an amount"))?;
            let amount: f64 = raw
                .parse()
                .with_context(|| format!("invalid amount '{raw}'"))?;
            anyhow::ensure!(amount.is_finite(), "amount must be a finite number");
            anyhow::ensure!(amount >= 0.0, "amount cannot be negative");
            Ok(amount)
        };

        match operation.as_str() {
            "add" => {
                let amount = amount(1)?;
                self.economy.add(identity, amount)?;
                Ok(ActionResult::success_with(format!(
                    "Added {}",
                    self.economy.format(amount)
                )))
            }
            "remove" => {
                let amount = amount(1)?;
                if !self.economy.has(identity, amount) {
                    return Ok(ActionResult::failure(format!(
                        "Insufficient funds: need {}",
                        self.economy.format(amount)
                    )));
                }
                self.economy.remove(identity, amount)?;
                Ok(ActionResult::success_with(format!(
                    "Removed {}",
                    self.economy.format(amount)
                )))
            }
            "set" => {
                let amount = amount(1)?;
                self.economy.set(identity, amount)?;
                Ok(ActionResult::success())
            }
            "check" if parts.len() > 1 => {
                let amount = amount(1)?;
                if self.economy.has(identity, amount) {
                    Ok(ActionResult::success())
                } else {
                    Ok(ActionResult::failure(format!(
                        "Insufficient funds: need {}",
                        self.economy.format(amount)
                    )))
                }
            }
            "check" => {
                let balance = self.economy.balance(identity);
                identity.send_message(&format!("Balance: {}", self.economy.format(balance)));
                Ok(ActionResult::success().with_payload(serde_json::json!({ "balance": balance })))
            }
            "pay" => {
                let target_name = parts
                    .get(1)
                    .filter(|t| !t.is_empty())
                    .context("economy pay needs a target")?;
                let amount = amount(2)?;
                let Some(directory) = &self.directory else {
                    return Ok(ActionResult::failure("No identity directory configured"));
                };
                let Some(target) = directory.resolve(target_name) else {
                    return Ok(ActionResult::failure(format!("Unknown player: {target_name}")));
                };
                if !self.economy.has(identity, amount) {
                    return Ok(ActionResult::failure("Insufficient funds"));
                }
                self.economy.remove(identity, amount)?;
                if let Err(e) = self.economy.add(&target, amount) {
                    // Put the money back before reporting.
                    if let Err(refund) = self.economy.add(identity, amount) {
                        tracing::error!(
                            "Refund of {} to {} failed: {:#}",
                            self.economy.format(amount),
                            identity.name(),
                            refund
                        );
                    }
                    return Err(e.context(format!("payment to {target_name} failed")));
                }
                directory.send_message(
                    &target,
                    &format!("{} paid you {}", identity.name(), self.economy.format(amount)),
                );
                Ok(ActionResult::success())
            }
            other => Ok(ActionResult::failure(format!(
                "Unknown economy operation: {other}"
            ))),
        }
    }
}

impl ActionHandler for EconomyHandler {
    fn action_type(&self) -> &str {
        "economy"
    }

    fn execute(
        &self,
        identity: &IdentityRef,
        value: &ActionValue,
        cx: &HandlerContext<'_>,
    ) -> anyhow::Result<ActionResult> {
        let specs = cx.operands(identity, value);
        if specs.is_empty() {
            return Ok(ActionResult::failure("No economy operation specified"));
        }
        let mut last = ActionResult::success();
        for spec in &specs {
            last = self.run(identity, spec)?;
            if last.is_failure() {
                return Ok(last);
            }
        }
        Ok(last)
    }

    fn validate(&self, value: &ActionValue) -> bool {
        value.body().operands.iter().all(|op| {
            let operation = op.split(':').next().unwrap_or_default().trim().to_lowercase();
            matches!(operation.as_str(), "add" | "remove" | "set" | "check" | "pay")
        }) && !value.body().operands.is_empty()
    }

    fn describe(&self) -> &str {
        "Adds, removes, sets, checks or transfers money"
    }

    fn usage_examples(&self) -> &[&str] {
        &[
            "economy { add:100 }",
            "economy { remove:50 }",
            "economy { check }",
            "economy { pay:Alex:25 }",
        ]
    }
}
