use crate::AwsDirectory;
use crate::error::{build_error, client_error};
use async_trait::async_trait;
use aws_sdk_ssoadmin::types as sdk;
use chrono::{DateTime, Utc};
use idc_core::{
    AccountAssignment, AssignmentSpec, AssignmentStatus, ClientError, Instance, PermissionSet,
    PermissionSetAttributes, PermissionSetSpec, PrincipalType,
};
use idc_runtime::{Page, SsoAdminClient};

#[async_trait]
impl SsoAdminClient for AwsDirectory {
    async fn list_instances(&self, next_token: Option<String>) -> Result<Page<Instance>, ClientError> {
        let output = self
            .sso_admin
            .list_instances()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| client_error("ListInstances", err))?;

        let items = output
            .instances()
            .iter()
            .filter_map(|instance| {
                Some(Instance {
                    instance_arn: instance.instance_arn()?.to_string(),
                    identity_store_id: instance.identity_store_id()?.to_string(),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn list_permission_sets(
        &self,
        instance_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        let output = self
            .sso_admin
            .list_permission_sets()
            .instance_arn(instance_arn)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| client_error("ListPermissionSets", err))?;

        Ok(Page {
            items: output.permission_sets().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
    ) -> Result<PermissionSet, ClientError> {
        let output = self
            .sso_admin
            .describe_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send()
            .await
            .map_err(|err| client_error("DescribePermissionSet", err))?;

        let described = output
            .permission_set()
            .ok_or_else(|| ClientError::NotFound(format!("DescribePermissionSet: {permission_set_arn}")))?;

        Ok(permission_set_from_sdk(described, permission_set_arn))
    }

    async fn list_managed_policies(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, ClientError> {
        let output = self
            .sso_admin
            .list_managed_policies_in_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| client_error("ListManagedPoliciesInPermissionSet", err))?;

        Ok(Page {
            items: output
                .attached_managed_policies()
                .iter()
                .filter_map(|policy| policy.arn().map(str::to_string))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn get_inline_policy(&self, instance_arn: &str, permission_set_arn: &str) -> Result<String, ClientError> {
        let output = self
            .sso_admin
            .get_inline_policy_for_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send()
            .await
            .map_err(|err| client_error("GetInlinePolicyForPermissionSet", err))?;

        Ok(output.inline_policy().unwrap_or_default().to_string())
    }

    async fn create_permission_set(
        &self,
        instance_arn: &str,
        spec: &PermissionSetSpec,
    ) -> Result<String, ClientError> {
        let tags = spec
            .tags
            .iter()
            .flatten()
            .map(|(key, value)| {
                sdk::Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|err| build_error("CreatePermissionSet", err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .sso_admin
            .create_permission_set()
            .instance_arn(instance_arn)
            .name(&spec.name)
            .set_description(spec.description.clone())
            .set_session_duration(spec.session_duration.clone())
            .set_relay_state(spec.relay_state.clone())
            .set_tags((!tags.is_empty()).then_some(tags))
            .send()
            .await
            .map_err(|err| client_error("CreatePermissionSet", err))?;

        output
            .permission_set()
            .and_then(|created| created.permission_set_arn())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Api("CreatePermissionSet: response carried no permission set ARN".to_string()))
    }

    async fn update_permission_set(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        attributes: &PermissionSetAttributes,
    ) -> Result<(), ClientError> {
        self.sso_admin
            .update_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .set_description(attributes.description.clone())
            .set_session_duration(attributes.session_duration.clone())
            .set_relay_state(attributes.relay_state.clone())
            .send()
            .await
            .map_err(|err| client_error("UpdatePermissionSet", err))?;
        Ok(())
    }

    async fn attach_managed_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy_arn: &str,
    ) -> Result<(), ClientError> {
        self.sso_admin
            .attach_managed_policy_to_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .managed_policy_arn(policy_arn)
            .send()
            .await
            .map_err(|err| client_error("AttachManagedPolicyToPermissionSet", err))?;
        Ok(())
    }

    async fn detach_managed_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        policy_arn: &str,
    ) -> Result<(), ClientError> {
        self.sso_admin
            .detach_managed_policy_from_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .managed_policy_arn(policy_arn)
            .send()
            .await
            .map_err(|err| client_error("DetachManagedPolicyFromPermissionSet", err))?;
        Ok(())
    }

    async fn put_inline_policy(
        &self,
        instance_arn: &str,
        permission_set_arn: &str,
        document: &str,
    ) -> Result<(), ClientError> {
        self.sso_admin
            .put_inline_policy_to_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .inline_policy(document)
            .send()
            .await
            .map_err(|err| client_error("PutInlinePolicyToPermissionSet", err))?;
        Ok(())
    }

    async fn delete_permission_set(&self, instance_arn: &str, permission_set_arn: &str) -> Result<(), ClientError> {
        self.sso_admin
            .delete_permission_set()
            .instance_arn(instance_arn)
            .permission_set_arn(permission_set_arn)
            .send()
            .await
            .map_err(|err| client_error("DeletePermissionSet", err))?;
        Ok(())
    }

    async fn list_account_assignments(
        &self,
        instance_arn: &str,
        account_id: &str,
        permission_set_arn: &str,
        next_token: Option<String>,
    ) -> Result<Page<AccountAssignment>, ClientError> {
        let output = self
            .sso_admin
            .list_account_assignments()
            .instance_arn(instance_arn)
            .account_id(account_id)
            .permission_set_arn(permission_set_arn)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| client_error("ListAccountAssignments", err))?;

        Ok(Page {
            items: output
                .account_assignments()
                .iter()
                .filter_map(assignment_from_sdk)
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn create_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &AssignmentSpec,
    ) -> Result<AssignmentStatus, ClientError> {
        let output = self
            .sso_admin
            .create_account_assignment()
            .instance_arn(instance_arn)
            .target_id(&assignment.target_id)
            .target_type(sdk::TargetType::from(assignment.target_type.as_str()))
            .permission_set_arn(&assignment.permission_set_arn)
            .principal_type(sdk::PrincipalType::from(assignment.principal_type.as_str()))
            .principal_id(&assignment.principal_id)
            .send()
            .await
            .map_err(|err| client_error("CreateAccountAssignment", err))?;

        Ok(status_from_sdk(output.account_assignment_creation_status()))
    }

    async fn delete_account_assignment(
        &self,
        instance_arn: &str,
        assignment: &AssignmentSpec,
    ) -> Result<AssignmentStatus, ClientError> {
        let output = self
            .sso_admin
            .delete_account_assignment()
            .instance_arn(instance_arn)
            .target_id(&assignment.target_id)
            .target_type(sdk::TargetType::from(assignment.target_type.as_str()))
            .permission_set_arn(&assignment.permission_set_arn)
            .principal_type(sdk::PrincipalType::from(assignment.principal_type.as_str()))
            .principal_id(&assignment.principal_id)
            .send()
            .await
            .map_err(|err| client_error("DeleteAccountAssignment", err))?;

        Ok(status_from_sdk(output.account_assignment_deletion_status()))
    }
}

fn permission_set_from_sdk(described: &sdk::PermissionSet, requested_arn: &str) -> PermissionSet {
    PermissionSet {
        permission_set_arn: described
            .permission_set_arn()
            .unwrap_or(requested_arn)
            .to_string(),
        name: described.name().unwrap_or_default().to_string(),
        description: described.description().map(str::to_string),
        session_duration: described.session_duration().map(str::to_string),
        relay_state: described.relay_state().map(str::to_string),
        created_date: described
            .created_date()
            .and_then(|date| DateTime::<Utc>::from_timestamp(date.secs(), date.subsec_nanos())),
        managed_policies: Vec::new(),
        inline_policy: None,
    }
}

fn assignment_from_sdk(assignment: &sdk::AccountAssignment) -> Option<AccountAssignment> {
    let principal_type = match assignment.principal_type()? {
        sdk::PrincipalType::User => PrincipalType::User,
        sdk::PrincipalType::Group => PrincipalType::Group,
        _ => return None,
    };

    Some(AccountAssignment {
        account_id: assignment.account_id()?.to_string(),
        permission_set_arn: assignment.permission_set_arn()?.to_string(),
        principal_type,
        principal_id: assignment.principal_id()?.to_string(),
    })
}

fn status_from_sdk(status: Option<&sdk::AccountAssignmentOperationStatus>) -> AssignmentStatus {
    AssignmentStatus {
        status: status
            .and_then(|s| s.status())
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        request_id: status.and_then(|s| s.request_id()).map(str::to_string),
        failure_reason: status.and_then(|s| s.failure_reason()).map(str::to_string),
    }
}
