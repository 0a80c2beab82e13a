use crate::models::Member;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    members: HashMap<String, Member>,
}

impl DirectoryIndex {
    pub fn build(members: &[Member]) -> Self {
        let mut index = HashMap::with_capacity(members.len());
        for member in members {
            if index.contains_key(&member.id) {
                tracing::warn!(member_id = %member.id, "duplicate member id; keeping first occurrence");
                continue;
            }
            index.insert(member.id.clone(), member.clone());
        }
        Self { members: index }
    }

    pub fn lookup(&self, id: &str) -> Option<&Member> {
        self.members.get(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
