use crate::domain::{Notification, StoreError};
use crate::interface_adapters::pipeline::{InvokeError, RequestPipeline};
use crate::interface_adapters::protocol::{
    LoginAdminRequest, LoginAdminResponse, MessageResponse, ResendOtpRequest, VerifyOtpRequest,
    VerifyOtpResponse,
};
use crate::interface_adapters::registry::names;

// Failures from the flow's write paths have already been reported to the sink.
#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Email + OTP sign-in flow.
///
/// `login` remembers the email so the OTP step can be completed later, possibly
/// from a fresh process when the session store is durable.
///
/// Tokens are rotated here, not in the pipeline: a bare `verifyOtp` invocation
/// returns the tokens without storing them, while [`SignInFlow::verify_otp`]
/// persists them and confirms the sign-in with a success notification.
#[derive(Clone)]
pub struct SignInFlow {
    pipeline: RequestPipeline,
}

impl SignInFlow {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    #[tracing::instrument(name = "login", skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginAdminResponse, SignInError> {
        let request = LoginAdminRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginAdminResponse = self.pipeline.call(names::LOGIN_ADMIN, &request).await?;

        // Keep the email around for the verify and resend steps.
        self.pipeline
            .credentials()
            .set_pending_email(email)
            .await
            .map_err(|err| self.storage_failed(err))?;
        tracing::info!("otp requested.");
        Ok(response)
    }

    #[tracing::instrument(name = "verify_otp", skip_all)]
    pub async fn verify_otp(&self, otp: &str) -> Result<VerifyOtpResponse, SignInError> {
        let credentials = self.pipeline.credentials();
        let email = credentials
            .pending_email()
            .await
            .map_err(|err| self.storage_failed(err))?
            .unwrap_or_default();
        // The server rejects an empty email with its own field error.
        if email.is_empty() {
            tracing::warn!("verifying otp without a pending login email.");
        }

        let request = VerifyOtpRequest {
            email,
            otp: otp.to_string(),
        };
        // A rejected OTP leaves the pending email in place for another attempt.
        let response: VerifyOtpResponse = self.pipeline.call(names::VERIFY_OTP, &request).await?;

        // Persist the new tokens before dropping the email, so a failed write
        // still lets the user retry the same OTP step.
        credentials
            .store_tokens(&response.access, &response.refresh)
            .await
            .map_err(|err| self.storage_failed(err))?;
        credentials
            .clear_pending_email()
            .await
            .map_err(|err| self.storage_failed(err))?;

        tracing::info!(role = %response.user.role, "admin signed in.");
        self.pipeline
            .notify(Notification::success("Success", "OTP verified successfully!"));
        Ok(response)
    }

    #[tracing::instrument(name = "resend_otp", skip_all)]
    pub async fn resend_otp(&self) -> Result<MessageResponse, SignInError> {
        let email = self
            .pipeline
            .credentials()
            .pending_email()
            .await
            .map_err(|err| self.storage_failed(err))?
            .unwrap_or_default();

        let response: MessageResponse = self
            .pipeline
            .call(names::RESEND_OTP, &ResendOtpRequest { email })
            .await?;

        // Failures are notified by the pipeline; the confirmation is ours.
        self.pipeline
            .notify(Notification::success("Success", "OTP resent successfully!"));
        Ok(response)
    }

    // Local only: the remote API has no sign-out endpoint.
    pub async fn sign_out(&self) -> Result<(), SignInError> {
        self.pipeline
            .credentials()
            .clear()
            .await
            .map_err(|err| self.storage_failed(err))?;
        tracing::info!("session cleared.");
        Ok(())
    }

    pub async fn is_signed_in(&self) -> Result<bool, SignInError> {
        Ok(self.pipeline.credentials().access_token().await?.is_some())
    }

    // Storage failures never reach the pipeline, so report them here.
    fn storage_failed(&self, err: StoreError) -> SignInError {
        tracing::error!(error = %err, "session storage failed.");
        self.pipeline
            .notify(Notification::destructive("Error", err.to_string()));
        SignInError::Storage(err)
    }
}
