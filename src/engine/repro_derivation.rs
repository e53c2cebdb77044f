// ==========================================
// 牧场繁育管理系统 - 繁育状态派生引擎
// ==========================================
// 职责: 将一头牛的繁育事件按因果顺序重放, 得到当前繁育状态
// 红线: 事件日志是唯一事实来源; 每次从空状态开始重放, 不以旧快照为基线
// 红线: Engine 不拼 SQL, 不访问仓储
// ==========================================

use crate::config::ReproductionParams;
use crate::domain::breeding::BreedingEvent;
use crate::domain::repro::ReproState;
use crate::domain::types::{BreedingEventType, EventResult, ReproStatus};
use chrono::{Days, NaiveDate};

// ==========================================
// ReproStatusDeriver
// ==========================================
pub struct ReproStatusDeriver {
    params: ReproductionParams,
}

impl ReproStatusDeriver {
    pub fn new(params: ReproductionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ReproductionParams {
        &self.params
    }

    /// 重放事件得到繁育状态（主入口）
    ///
    /// # 参数
    /// - events: 该牛的全部繁育事件（顺序不限, 内部按 日期+写入序号 排序）
    /// - today: 当前日期（用于产后期回落判定）
    ///
    /// # 说明
    /// 纯函数: 相同事件与相同 today 必然得到相同结果
    pub fn derive(&self, events: &[BreedingEvent], today: NaiveDate) -> ReproState {
        let mut ordered: Vec<&BreedingEvent> = events.iter().collect();
        ordered.sort_by(|a, b| a.chronological_cmp(b));

        let mut state = ReproState::default();
        for event in ordered {
            self.apply(&mut state, event);
        }

        self.finish(&mut state, today);
        state
    }

    /// 折叠单个事件
    ///
    /// 未列出的结果（疑似发情、配种失败、妊检不确定、死胎、其他）不改变状态
    fn apply(&self, state: &mut ReproState, event: &BreedingEvent) {
        match (event.event_type, event.result) {
            (BreedingEventType::HeatDetection, EventResult::Confirmed) => {
                state.last_heat_date = Some(event.event_date);
                state.status = ReproStatus::InHeat;
                state.clear_expected_calving();
            }
            (BreedingEventType::Insemination, EventResult::Completed) => {
                state.last_insemination_date = Some(event.event_date);
                state.status = ReproStatus::Inseminated;
                // 复配: 之前的预产期只对上一次配种有效
                state.clear_expected_calving();
            }
            (BreedingEventType::PregnancyCheck, EventResult::Positive) => {
                state.status = ReproStatus::Pregnant;
                if let Some(inseminated_on) = state.last_insemination_date {
                    state.set_expected_calving(add_days(inseminated_on, self.params.gestation_days));
                }
            }
            (BreedingEventType::PregnancyCheck, EventResult::Negative) => {
                state.status = ReproStatus::Open;
                state.clear_expected_calving();
            }
            (BreedingEventType::Calving, EventResult::Healthy | EventResult::Complications) => {
                state.status = ReproStatus::Fresh;
                state.last_calving_date = Some(event.event_date);
                state.calving_count += 1;
                // 本胎次结束: 下一次妊娠需要新的配种记录才能推算预产期
                state.last_insemination_date = None;
                state.clear_expected_calving();
            }
            _ => {}
        }
    }

    /// 重放完成后的派生字段
    fn finish(&self, state: &mut ReproState, today: NaiveDate) {
        state.next_heat_date = match (state.last_heat_date, state.status) {
            (Some(heat), status) if status != ReproStatus::Pregnant => {
                Some(add_days(heat, self.params.heat_cycle_days))
            }
            _ => None,
        };

        if self.fresh_period_elapsed(state, today) {
            state.status = ReproStatus::Open;
        }
    }

    /// 产后期是否已过（仅对 Fresh 状态有意义）
    ///
    /// today 严格大于 产犊日 + 产后期天数 时回落为 Open
    pub fn fresh_period_elapsed(&self, state: &ReproState, today: NaiveDate) -> bool {
        match (state.status, state.last_calving_date) {
            (ReproStatus::Fresh, Some(calved)) => {
                today > add_days(calved, self.params.fresh_period_days)
            }
            _ => false,
        }
    }
}

/// 日期加天数; 参数为负时按 0 处理
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX)
}
