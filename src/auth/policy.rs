//! Pure access-control decisions.
//!
//! Every rule is a function over the caller and the resource; no I/O
//! happens here. Handlers call these before touching the service layer
//! and translate `Err` straight into HTTP responses.

use uuid::Uuid;

use super::AuthUser;
use crate::entities::OrderModel;
use crate::errors::ServiceError;

/// Role name granted to restaurant managers.
pub const MANAGER: &str = "manager";
/// Role name granted to delivery staff.
pub const DELIVERY_CREW: &str = "delivery-crew";

/// Staff group addressed by the `/groups/:group/users` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum StaffGroup {
    #[strum(serialize = "manager")]
    Manager,
    #[strum(serialize = "delivery-crew")]
    DeliveryCrew,
}

impl StaffGroup {
    /// Role string stored in `user_roles` for members of this group.
    pub fn role_name(&self) -> &'static str {
        match self {
            StaffGroup::Manager => MANAGER,
            StaffGroup::DeliveryCrew => DELIVERY_CREW,
        }
    }
}

/// Which orders a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Managers see every order.
    All,
    /// Delivery crew see orders assigned to them.
    AssignedTo(Uuid),
    /// Everyone else sees their own orders.
    OwnedBy(Uuid),
}

pub fn order_list_scope(user: &AuthUser) -> OrderScope {
    if user.is_manager() {
        OrderScope::All
    } else if user.is_delivery_crew() {
        OrderScope::AssignedTo(user.user_id)
    } else {
        OrderScope::OwnedBy(user.user_id)
    }
}

/// Owner, manager, or the assigned crew member may view an order.
pub fn authorize_order_view(user: &AuthUser, order: &OrderModel) -> Result<(), ServiceError> {
    let is_owner = order.user_id == user.user_id;
    let is_assigned_crew = order.delivery_crew_id == Some(user.user_id);

    if is_owner || user.is_manager() || is_assigned_crew {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "you are not authorized to view this order".to_string(),
        ))
    }
}

/// Managers may change any order field. The assigned delivery crew
/// member may change the status, and nothing else.
pub fn authorize_order_update(
    user: &AuthUser,
    order: &OrderModel,
    only_status: bool,
) -> Result<(), ServiceError> {
    if user.is_manager() {
        return Ok(());
    }

    if user.is_delivery_crew() {
        if order.delivery_crew_id != Some(user.user_id) {
            return Err(ServiceError::Forbidden(
                "this order is not assigned to you".to_string(),
            ));
        }
        if !only_status {
            return Err(ServiceError::Forbidden(
                "delivery crew may only update the order status".to_string(),
            ));
        }
        return Ok(());
    }

    Err(ServiceError::Forbidden(
        "you are not authorized to update this order".to_string(),
    ))
}

pub fn authorize_order_delete(user: &AuthUser) -> Result<(), ServiceError> {
    if user.is_manager() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "only managers may delete orders".to_string(),
        ))
    }
}

/// Manager group membership is listed by managers or superusers;
/// delivery-crew membership by managers.
pub fn authorize_group_list(user: &AuthUser, group: StaffGroup) -> Result<(), ServiceError> {
    let allowed = match group {
        StaffGroup::Manager => user.is_manager() || user.is_superuser,
        StaffGroup::DeliveryCrew => user.is_manager(),
    };

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "you are not authorized to view this group".to_string(),
        ))
    }
}

/// Manager group membership is changed by superusers only;
/// delivery-crew membership by managers.
pub fn authorize_group_mutate(user: &AuthUser, group: StaffGroup) -> Result<(), ServiceError> {
    let allowed = match group {
        StaffGroup::Manager => user.is_superuser,
        StaffGroup::DeliveryCrew => user.is_manager(),
    };

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "you are not authorized to change this group".to_string(),
        ))
    }
}

/// Catalog writes require authentication. With `restrict_writes` on,
/// they additionally require the manager role (the upstream behavior of
/// letting any authenticated user write the catalog is preserved as the
/// default but is configurable away).
pub fn authorize_catalog_write(
    user: Option<&AuthUser>,
    restrict_writes: bool,
) -> Result<(), ServiceError> {
    let user = user.ok_or_else(|| {
        ServiceError::Unauthorized("authentication required".to_string())
    })?;

    if restrict_writes && !user.is_manager() {
        return Err(ServiceError::Forbidden(
            "only managers may modify the catalog".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::entities::OrderStatus;

    fn caller(roles: &[&str], is_superuser: bool) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "test".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            is_superuser,
        }
    }

    fn order_for(user_id: Uuid, crew: Option<Uuid>) -> OrderModel {
        OrderModel {
            id: Uuid::new_v4(),
            user_id,
            delivery_crew_id: crew,
            status: OrderStatus::Placed,
            total: Decimal::ZERO,
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn staff_group_parses_url_segments() {
        assert_eq!(StaffGroup::from_str("manager").unwrap(), StaffGroup::Manager);
        assert_eq!(
            StaffGroup::from_str("delivery-crew").unwrap(),
            StaffGroup::DeliveryCrew
        );
        assert!(StaffGroup::from_str("chefs").is_err());
    }

    #[test]
    fn list_scope_prefers_manager_over_crew() {
        let both = caller(&[MANAGER, DELIVERY_CREW], false);
        assert_eq!(order_list_scope(&both), OrderScope::All);

        let crew = caller(&[DELIVERY_CREW], false);
        assert_eq!(
            order_list_scope(&crew),
            OrderScope::AssignedTo(crew.user_id)
        );

        let customer = caller(&[], false);
        assert_eq!(
            order_list_scope(&customer),
            OrderScope::OwnedBy(customer.user_id)
        );
    }

    #[test]
    fn owner_manager_and_assigned_crew_can_view() {
        let owner = caller(&[], false);
        let manager = caller(&[MANAGER], false);
        let crew = caller(&[DELIVERY_CREW], false);
        let stranger = caller(&[], false);

        let order = order_for(owner.user_id, Some(crew.user_id));

        assert!(authorize_order_view(&owner, &order).is_ok());
        assert!(authorize_order_view(&manager, &order).is_ok());
        assert!(authorize_order_view(&crew, &order).is_ok());
        assert!(matches!(
            authorize_order_view(&stranger, &order),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn crew_updates_are_limited_to_status() {
        let crew = caller(&[DELIVERY_CREW], false);
        let order = order_for(Uuid::new_v4(), Some(crew.user_id));

        assert!(authorize_order_update(&crew, &order, true).is_ok());
        assert!(matches!(
            authorize_order_update(&crew, &order, false),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn crew_cannot_update_unassigned_orders() {
        let crew = caller(&[DELIVERY_CREW], false);
        let unassigned = order_for(Uuid::new_v4(), None);
        let other_crew = order_for(Uuid::new_v4(), Some(Uuid::new_v4()));

        assert!(authorize_order_update(&crew, &unassigned, true).is_err());
        assert!(authorize_order_update(&crew, &other_crew, true).is_err());
    }

    #[test]
    fn manager_updates_any_field_and_owner_updates_nothing() {
        let manager = caller(&[MANAGER], false);
        let owner = caller(&[], false);
        let order = order_for(owner.user_id, None);

        assert!(authorize_order_update(&manager, &order, false).is_ok());
        assert!(authorize_order_update(&owner, &order, true).is_err());
    }

    #[test]
    fn only_managers_delete_orders() {
        assert!(authorize_order_delete(&caller(&[MANAGER], false)).is_ok());
        assert!(authorize_order_delete(&caller(&[DELIVERY_CREW], false)).is_err());
        assert!(authorize_order_delete(&caller(&[], true)).is_err());
    }

    #[test]
    fn manager_group_rules() {
        let superuser = caller(&[], true);
        let manager = caller(&[MANAGER], false);
        let customer = caller(&[], false);

        assert!(authorize_group_list(&superuser, StaffGroup::Manager).is_ok());
        assert!(authorize_group_list(&manager, StaffGroup::Manager).is_ok());
        assert!(authorize_group_list(&customer, StaffGroup::Manager).is_err());

        assert!(authorize_group_mutate(&superuser, StaffGroup::Manager).is_ok());
        assert!(authorize_group_mutate(&manager, StaffGroup::Manager).is_err());
    }

    #[test]
    fn delivery_crew_group_rules() {
        let superuser = caller(&[], true);
        let manager = caller(&[MANAGER], false);

        assert!(authorize_group_list(&manager, StaffGroup::DeliveryCrew).is_ok());
        assert!(authorize_group_mutate(&manager, StaffGroup::DeliveryCrew).is_ok());
        // Superuser status alone does not grant crew-group management.
        assert!(authorize_group_list(&superuser, StaffGroup::DeliveryCrew).is_err());
        assert!(authorize_group_mutate(&superuser, StaffGroup::DeliveryCrew).is_err());
    }

    #[test]
    fn catalog_writes_require_authentication() {
        assert!(matches!(
            authorize_catalog_write(None, false),
            Err(ServiceError::Unauthorized(_))
        ));

        let customer = caller(&[], false);
        assert!(authorize_catalog_write(Some(&customer), false).is_ok());
    }

    #[test]
    fn restricted_catalog_writes_require_manager() {
        let customer = caller(&[], false);
        let manager = caller(&[MANAGER], false);

        assert!(matches!(
            authorize_catalog_write(Some(&customer), true),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(authorize_catalog_write(Some(&manager), true).is_ok());
    }
}
