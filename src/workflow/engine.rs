//! 流程引擎 - 流程层
//!
//! 以"具名步骤 + 边"描述一条流水线：
//! - 步骤函数接收上下文引用和当前状态，返回完整的新状态
//! - 边分为无条件边和条件边，条件边由判断函数返回的标签选择去向
//! - 到达 [`END`] 时结束，返回最终状态
//!
//! 引擎本身不捕获步骤内部的失败。每个步骤负责把失败写进状态，
//! 引擎只报告图本身的配置错误（见 [`WorkflowError`]）。

use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::WorkflowError;

/// 终止标记
pub const END: &str = "__end__";

/// 默认最多执行的步骤数
pub const DEFAULT_STEP_LIMIT: usize = 1000;

type StepFn<C, S> = Box<dyn for<'a> Fn(&'a C, S) -> BoxFuture<'a, S> + Send + Sync>;
type RouteFn<S> = Box<dyn Fn(&S) -> &'static str + Send + Sync>;

enum Edge<S> {
    Direct(&'static str),
    Conditional {
        predicate: RouteFn<S>,
        routes: HashMap<&'static str, &'static str>,
    },
}

/// 一条流水线的定义
///
/// `C` 是运行期间只读的上下文（自动化目标、配置等），`S` 是在步骤间传递的状态
pub struct Workflow<C, S> {
    name: &'static str,
    steps: HashMap<&'static str, StepFn<C, S>>,
    edges: HashMap<&'static str, Edge<S>>,
    entry: Option<&'static str>,
    step_limit: usize,
}

impl<C, S> Workflow<C, S>
where
    C: Sync,
    S: Send,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// 注册步骤
    pub fn register<F>(mut self, name: &'static str, step: F) -> Self
    where
        F: for<'a> Fn(&'a C, S) -> BoxFuture<'a, S> + Send + Sync + 'static,
    {
        self.steps.insert(name, Box::new(step));
        self
    }

    /// 无条件边
    pub fn edge(mut self, from: &'static str, to: &'static str) -> Self {
        self.edges.insert(from, Edge::Direct(to));
        self
    }

    /// 条件边：`predicate` 返回的标签在 `routes` 中查找去向
    pub fn conditional_edge<P>(
        mut self,
        from: &'static str,
        predicate: P,
        routes: &[(&'static str, &'static str)],
    ) -> Self
    where
        P: Fn(&S) -> &'static str + Send + Sync + 'static,
    {
        self.edges.insert(
            from,
            Edge::Conditional {
                predicate: Box::new(predicate),
                routes: routes.iter().copied().collect(),
            },
        );
        self
    }

    pub fn set_entry(mut self, name: &'static str) -> Self {
        self.entry = Some(name);
        self
    }

    /// 设置最多执行的步骤数，防止环路无限执行
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    fn unknown_step(&self, step: &str) -> WorkflowError {
        WorkflowError::UnknownStep {
            workflow: self.name.to_string(),
            step: step.to_string(),
        }
    }

    fn check_target(&self, target: &str) -> Result<(), WorkflowError> {
        if target == END || self.steps.contains_key(target) {
            Ok(())
        } else {
            Err(self.unknown_step(target))
        }
    }

    /// 检查图是否完整：入口存在，每个步骤都有出边，所有去向都已注册
    pub fn validate(&self) -> Result<&'static str, WorkflowError> {
        let entry = self.entry.ok_or_else(|| WorkflowError::MissingEntry {
            workflow: self.name.to_string(),
        })?;
        if !self.steps.contains_key(entry) {
            return Err(self.unknown_step(entry));
        }

        for (from, edge) in &self.edges {
            if !self.steps.contains_key(from) {
                return Err(self.unknown_step(from));
            }
            match edge {
                Edge::Direct(to) => self.check_target(to)?,
                Edge::Conditional { routes, .. } => {
                    for to in routes.values() {
                        self.check_target(to)?;
                    }
                }
            }
        }

        for step in self.steps.keys() {
            if !self.edges.contains_key(step) {
                return Err(WorkflowError::MissingEdge {
                    workflow: self.name.to_string(),
                    step: step.to_string(),
                });
            }
        }

        Ok(entry)
    }

    /// 从入口开始执行，直到到达 [`END`]
    ///
    /// 前一个步骤完全结束后才开始下一个步骤
    pub async fn run(&self, ctx: &C, initial: S) -> Result<S, WorkflowError> {
        let mut current = self.validate()?;
        let mut state = initial;
        let mut executed = 0usize;

        loop {
            if executed >= self.step_limit {
                return Err(WorkflowError::StepLimitExceeded {
                    workflow: self.name.to_string(),
                    limit: self.step_limit,
                });
            }

            let step = self
                .steps
                .get(current)
                .ok_or_else(|| self.unknown_step(current))?;
            debug!("[{}] 执行步骤: {}", self.name, current);
            state = step(ctx, state).await;
            executed += 1;

            let next = match self.edges.get(current) {
                Some(Edge::Direct(to)) => *to,
                Some(Edge::Conditional { predicate, routes }) => {
                    let label = predicate(&state);
                    debug!("[{}] 步骤 {} 分支: {}", self.name, current, label);
                    routes.get(label).copied().ok_or_else(|| {
                        WorkflowError::UnknownRoute {
                            workflow: self.name.to_string(),
                            step: current.to_string(),
                            label: label.to_string(),
                        }
                    })?
                }
                None => {
                    return Err(WorkflowError::MissingEdge {
                        workflow: self.name.to_string(),
                        step: current.to_string(),
                    })
                }
            };

            if next == END {
                debug!("[{}] 流程结束，共执行 {} 步", self.name, executed);
                return Ok(state);
            }
            current = next;
        }
    }
}
