use crate::dto::ApiResponse;
use crate::services::{
    Command, CommandOutcome, CommandService, CoreContext, ReconciliationReport,
    ReconciliationService,
};
use crate::utils::errors::AppResult;

pub struct CommandController {
    commands: CommandService,
    reconciliation: ReconciliationService,
}

impl CommandController {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            commands: CommandService::new(ctx.clone()),
            reconciliation: ReconciliationService::new(ctx),
        }
    }

    pub async fn execute(&self, command: Command) -> AppResult<ApiResponse<CommandOutcome>> {
        let name = command.name();
        let outcome = self.commands.execute(command).await?;
        Ok(ApiResponse::success_with_message(
            outcome,
            format!("Comando {} ejecutado", name),
        ))
    }

    pub async fn reconcile(&self) -> AppResult<ApiResponse<ReconciliationReport>> {
        let report = self.reconciliation.reconcile_all().await?;
        let message = format!("{} correcciones aplicadas", report.corrections.len());
        Ok(ApiResponse::success_with_message(report, message))
    }
}
