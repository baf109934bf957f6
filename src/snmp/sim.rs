use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{Duration, sleep};

use super::{Credential, ObjectId, SnmpTransport, SnmpValue, VarBind};
use crate::error::WalkError;

/// Как симулированный агент сбоит.
#[derive(Debug, Clone)]
pub enum AgentFault {
    /// Каждый запрос падает, как будто хост лежит.
    Unreachable,
    /// Каждый ответ задерживается.
    Slow(Duration),
    /// Агент возвращает запрошенный OID и не продвигается дальше.
    Loop,
    /// Обработчик запроса паникует.
    Panic,
}

#[derive(Default)]
struct Agent {
    mib: BTreeMap<ObjectId, SnmpValue>,
    fault: Option<AgentFault>,
    requests: usize,
}

/// Агенты в памяти по адресу, отвечают на GETBULK из отсортированного MIB view.
#[derive(Default)]
pub struct SimulatedNetwork {
    agents: Mutex<HashMap<String, Agent>>,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ставит `oid = value` агенту по `address` (порт 161, если не указан).
    pub fn set(&self, address: &str, oid: ObjectId, value: SnmpValue) {
        let key = Credential::new(address, "").address().to_string();
        self.agents.lock().entry(key).or_default().mib.insert(oid, value);
    }

    /// Ставит одну строку таблицы: каждая `(column, value)` ложится в `entry.column.index`.
    pub fn set_row(
        &self,
        address: &str,
        entry: &ObjectId,
        index: &[u32],
        cells: impl IntoIterator<Item = (u32, SnmpValue)>,
    ) {
        for (column, value) in cells {
            let mut arcs = Vec::with_capacity(index.len() + 1);
            arcs.push(column);
            arcs.extend_from_slice(index);
            self.set(address, entry.child(&arcs), value);
        }
    }

    pub fn set_fault(&self, address: &str, fault: AgentFault) {
        let key = Credential::new(address, "").address().to_string();
        self.agents.lock().entry(key).or_default().fault = Some(fault);
    }

    /// Сколько запросов обслужено (или отклонено) для `address`.
    pub fn requests(&self, address: &str) -> usize {
        let key = Credential::new(address, "").address().to_string();
        self.agents.lock().get(&key).map(|a| a.requests).unwrap_or(0)
    }

    fn answer(&self, target: &Credential, from: &ObjectId, max_repetitions: u32) -> Reply {
        let mut agents = self.agents.lock();
        let Some(agent) = agents.get_mut(target.address()) else {
            return Reply::Err(WalkError::Transport(format!(
                "no route to {}",
                target.address()
            )));
        };
        agent.requests += 1;

        match &agent.fault {
            Some(AgentFault::Unreachable) => {
                return Reply::Err(WalkError::Transport(format!(
                    "request to {} timed out",
                    target.address()
                )));
            }
            Some(AgentFault::Loop) => {
                return Reply::Ok(vec![VarBind::new(from.clone(), SnmpValue::Integer(0))]);
            }
            Some(AgentFault::Panic) => return Reply::Panic,
            Some(AgentFault::Slow(delay)) => {
                let delay = *delay;
                return Reply::Delayed(delay, self.collect(agent, from, max_repetitions));
            }
            None => {}
        }

        Reply::Ok(self.collect(agent, from, max_repetitions))
    }

    fn collect(&self, agent: &Agent, from: &ObjectId, max_repetitions: u32) -> Vec<VarBind> {
        let mut varbinds: Vec<VarBind> = agent
            .mib
            .range((Bound::Excluded(from.clone()), Bound::Unbounded))
            .take(max_repetitions.max(1) as usize)
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()))
            .collect();

        if varbinds.is_empty() {
            varbinds.push(VarBind::new(from.clone(), SnmpValue::EndOfMibView));
        }
        varbinds
    }
}

enum Reply {
    Ok(Vec<VarBind>),
    Delayed(Duration, Vec<VarBind>),
    Err(WalkError),
    Panic,
}

#[async_trait]
impl SnmpTransport for SimulatedNetwork {
    async fn get_bulk(
        &self,
        target: &Credential,
        from: &ObjectId,
        max_repetitions: u32,
    ) -> Result<Vec<VarBind>, WalkError> {
        match self.answer(target, from, max_repetitions) {
            Reply::Ok(varbinds) => Ok(varbinds),
            Reply::Delayed(delay, varbinds) => {
                sleep(delay).await;
                Ok(varbinds)
            }
            Reply::Err(err) => Err(err),
            Reply::Panic => panic!("simulated agent {} crashed", target.address()),
        }
    }

    async fn close(&self) {
        self.agents.lock().clear();
    }
}
