//! 患者可见范围
//!
//! 根据用户类型决定用户能够访问哪些患者记录。

use crate::models::{Facility, Patient, User, UserType};
use uuid::Uuid;

/// 用户可访问的患者范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientScope {
    /// 超级管理员，可访问全部患者
    All,
    /// 省级管理员，按省筛选
    State(i32),
    /// 区级管理员，按区筛选
    District(i32),
    /// 普通用户：所属机构的患者，以及本人创建的患者
    Facilities { user_id: Uuid },
}

impl PatientScope {
    pub fn for_user(user: &User) -> Self {
        if user.is_superuser {
            return PatientScope::All;
        }
        if user.user_type >= UserType::STATE_LAB_ADMIN {
            if let Some(state_id) = user.state_id {
                return PatientScope::State(state_id);
            }
        }
        if user.user_type >= UserType::DISTRICT_LAB_ADMIN {
            if let Some(district_id) = user.district_id {
                return PatientScope::District(district_id);
            }
        }
        PatientScope::Facilities { user_id: user.id }
    }

    /// 判断患者是否在范围内
    ///
    /// `facility` 为患者所在机构，`member_facilities` 为用户所属机构。
    pub fn admits(
        &self,
        patient: &Patient,
        facility: Option<&Facility>,
        member_facilities: &[Uuid],
    ) -> bool {
        match *self {
            PatientScope::All => true,
            PatientScope::State(state_id) => facility.map_or(false, |f| f.state_id == state_id),
            PatientScope::District(district_id) => {
                facility.map_or(false, |f| f.district_id == district_id)
            }
            PatientScope::Facilities { user_id } => {
                patient.created_by == Some(user_id)
                    || patient
                        .facility_id
                        .map_or(false, |id| member_facilities.contains(&id))
            }
        }
    }
}
