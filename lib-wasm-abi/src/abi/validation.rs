//! Static ABI checks run at load time.
//!
//! Everything the recursive transcoder relies on is proved here before any
//! payload is touched: typedef chains terminate, inheritance chains
//! terminate, every referenced type exists, and no struct can reach itself
//! through nested fields. Each loop checks the traversal deadline, so even a
//! pathological schema fails in bounded time.

use std::collections::HashSet;

use crate::abi::context::TraverseContext;
use crate::abi::errors::{AbiError, AbiResult};
use crate::abi::schema::StructDef;
use crate::abi::serializer::AbiSerializer;
use crate::abi::typename::{fundamental_type, remove_bin_extension};

impl AbiSerializer {
    pub(crate) fn validate(&self, ctx: &mut TraverseContext) -> AbiResult<()> {
        // typedef chains must terminate
        for (new_type, target) in &self.typedefs {
            let mut types_seen = vec![new_type.clone(), target.clone()];
            let mut current = self.typedefs.get(target);
            while let Some(next) = current {
                ctx.check_deadline()?;
                if types_seen.contains(next) {
                    return Err(AbiError::AbiCircularDef(next.clone())
                        .context(format!("typedef '{new_type}'")));
                }
                types_seen.push(next.clone());
                current = self.typedefs.get(next);
            }
        }

        // typedef targets must name known types
        for (new_type, target) in &self.typedefs {
            if !self.is_type_inner(target, ctx)? {
                return Err(AbiError::InvalidTypeInsideAbi(target.clone())
                    .context(format!("typedef '{new_type}'")));
            }
        }

        // inheritance chains must terminate on known structs
        for struct_def in self.structs.values() {
            if struct_def.base.is_empty() {
                continue;
            }
            let mut types_seen = vec![struct_def.name.clone()];
            let mut current = struct_def;
            while !current.base.is_empty() {
                ctx.check_deadline()?;
                let base = self
                    .get_struct(&current.base)
                    .map_err(|e| e.context(format!("struct '{}'", struct_def.name)))?;
                if types_seen.contains(&base.name) {
                    return Err(AbiError::AbiCircularDef(struct_def.name.clone())
                        .context(format!("struct '{}'", struct_def.name)));
                }
                types_seen.push(base.name.clone());
                current = base;
            }
        }

        // every field must name a known type (a trailing `$` is cosmetic)
        for struct_def in self.structs.values() {
            for field in &struct_def.fields {
                ctx.check_deadline()?;
                if !self.is_type_inner(remove_bin_extension(&field.type_name), ctx)? {
                    return Err(AbiError::InvalidTypeInsideAbi(field.type_name.clone()).context(
                        format!("struct '{}' field '{}'", struct_def.name, field.name),
                    ));
                }
            }
        }

        // the nested-field graph must stay a DAG; a struct may appear under
        // many parents but never under itself
        let mut visited = HashSet::new();
        for struct_def in self.structs.values() {
            let mut ctx2 = TraverseContext::new(self.max_serialization_time);
            let mut ancestors = Vec::new();
            self.check_struct_in_recursion(struct_def, &mut ancestors, &mut visited, &mut ctx2)
                .map_err(|e| e.context(format!("struct '{}'", struct_def.name)))?;
        }

        // actions and tables must target known types
        for (action, target) in &self.actions {
            ctx.check_deadline()?;
            if !self.is_type_inner(target, ctx)? {
                return Err(AbiError::InvalidTypeInsideAbi(target.clone())
                    .context(format!("action '{action}'")));
            }
        }
        for (table, target) in &self.tables {
            ctx.check_deadline()?;
            if !self.is_type_inner(target, ctx)? {
                return Err(AbiError::InvalidTypeInsideAbi(target.clone())
                    .context(format!("table '{table}'")));
            }
        }

        Ok(())
    }

    /// Depth-first walk over resolved fundamental field types. Finding the
    /// current struct among its own ancestors is a cycle; a struct already
    /// visited under a different parent is skipped, not re-descended.
    fn check_struct_in_recursion(
        &self,
        struct_def: &StructDef,
        ancestors: &mut Vec<String>,
        visited: &mut HashSet<String>,
        ctx: &mut TraverseContext,
    ) -> AbiResult<()> {
        if ancestors.iter().any(|name| name == &struct_def.name) {
            return Err(AbiError::CircularReferenceInStruct(struct_def.name.clone()));
        }
        if !visited.insert(struct_def.name.clone()) {
            return Ok(());
        }
        ctx.check_deadline()?;

        ancestors.push(struct_def.name.clone());
        let mut fields_seen: Vec<String> = Vec::new();
        for field in &struct_def.fields {
            ctx.check_deadline()?;
            let fundamental =
                self.resolve_type(fundamental_type(remove_bin_extension(&field.type_name)));
            if fields_seen.contains(&fundamental) {
                continue;
            }
            fields_seen.push(fundamental.clone());
            if let Some(inner) = self.structs.get(&fundamental) {
                self.check_struct_in_recursion(inner, ancestors, visited, ctx)?;
            }
        }
        ancestors.pop();
        Ok(())
    }
}
