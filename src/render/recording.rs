use std::collections::{HashMap, HashSet};

use super::backend::{
    BackendError, BufferData, BufferHandle, Primitive, ProgramHandle, RenderBackend, Uniform,
};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CompileProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    AllocateBuffer { buffer: BufferHandle, len: usize },
    ReleaseBuffer(BufferHandle),
    BindAttribute {
        program: ProgramHandle,
        name: String,
        buffer: BufferHandle,
        components: usize,
    },
    BindIndices(BufferHandle),
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: Uniform,
    },
    Draw {
        program: ProgramHandle,
        primitive: Primitive,
        count: usize,
    },
}

#[derive(Debug, Clone)]
struct Program {
    attributes: HashSet<String>,
    uniforms: HashSet<String>,
    values: HashMap<String, Uniform>,
}

#[derive(Debug, Clone)]
enum Buffer {
    Attribute,
    Index(Vec<u32>),
}

/// A backend with no GPU behind it.
///
/// It checks every call the way a real driver would (names must exist in the
/// program, handles must be live, indexed draws need an index buffer) and
/// keeps a log of everything that happened. The headless simulator draws
/// into one, and the tests inspect its log.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: Vec<Program>,
    buffers: HashMap<BufferHandle, Buffer>,
    next_buffer: usize,
    current_program: Option<ProgramHandle>,
    bound_indices: Option<BufferHandle>,
    commands: Vec<Command>,
    /// When set, every `compile_program` fails.
    pub fail_compilation: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draws(&self) -> impl Iterator<Item = &Command> + '_ {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// The value a uniform currently holds in `program`.
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<Uniform> {
        self.programs.get(program.0)?.values.get(name).copied()
    }

    fn program(&self, handle: ProgramHandle) -> Result<&Program, BackendError> {
        self.programs
            .get(handle.0)
            .ok_or(BackendError::UnknownProgram(handle))
    }
}

/// Collects the names declared with `keyword` (`attribute`, `uniform`).
fn declared_names(src: &str, keyword: &str) -> HashSet<String> {
    src.lines()
        .filter_map(|line| {
            let mut words = line.trim().trim_end_matches(';').split_whitespace();
            if words.next()? != keyword {
                return None;
            }
            // skip the type
            words.next()?;
            words.next().map(str::to_owned)
        })
        .collect()
}

impl RenderBackend for RecordingBackend {
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, BackendError> {
        if self.fail_compilation {
            return Err(BackendError::Compile("compilation disabled".to_owned()));
        }
        if !vertex_src.contains("void main") || !fragment_src.contains("void main") {
            return Err(BackendError::Compile("missing entry point".to_owned()));
        }

        let mut uniforms = declared_names(vertex_src, "uniform");
        uniforms.extend(declared_names(fragment_src, "uniform"));
        let handle = ProgramHandle(self.programs.len());
        self.programs.push(Program {
            attributes: declared_names(vertex_src, "attribute"),
            uniforms,
            values: HashMap::new(),
        });
        self.commands.push(Command::CompileProgram(handle));
        Ok(handle)
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), BackendError> {
        self.program(program)?;
        self.current_program = Some(program);
        self.commands.push(Command::UseProgram(program));
        Ok(())
    }

    fn allocate_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, BackendError> {
        let handle = BufferHandle(self.next_buffer);
        self.next_buffer += 1;
        let (buffer, len) = match data {
            BufferData::Attribute(floats) => (Buffer::Attribute, floats.len()),
            BufferData::Index(indices) => (Buffer::Index(indices.to_vec()), indices.len()),
        };
        self.buffers.insert(handle, buffer);
        self.commands.push(Command::AllocateBuffer { buffer: handle, len });
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) -> Result<(), BackendError> {
        self.buffers
            .remove(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if self.bound_indices == Some(buffer) {
            self.bound_indices = None;
        }
        self.commands.push(Command::ReleaseBuffer(buffer));
        Ok(())
    }

    fn bind_attribute(
        &mut self,
        program: ProgramHandle,
        name: &str,
        buffer: BufferHandle,
        components_per_vertex: usize,
    ) -> Result<(), BackendError> {
        if !self.program(program)?.attributes.contains(name) {
            return Err(BackendError::MissingAttribute(name.to_owned()));
        }
        match self.buffers.get(&buffer) {
            Some(Buffer::Attribute) => {}
            _ => return Err(BackendError::UnknownBuffer(buffer)),
        }
        self.commands.push(Command::BindAttribute {
            program,
            name: name.to_owned(),
            buffer,
            components: components_per_vertex,
        });
        Ok(())
    }

    fn bind_indices(&mut self, buffer: BufferHandle) -> Result<(), BackendError> {
        match self.buffers.get(&buffer) {
            Some(Buffer::Index(_)) => {}
            _ => return Err(BackendError::UnknownBuffer(buffer)),
        }
        self.bound_indices = Some(buffer);
        self.commands.push(Command::BindIndices(buffer));
        Ok(())
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: Uniform,
    ) -> Result<(), BackendError> {
        if !self.program(program)?.uniforms.contains(name) {
            return Err(BackendError::MissingUniform(name.to_owned()));
        }
        self.programs[program.0]
            .values
            .insert(name.to_owned(), value);
        self.commands.push(Command::SetUniform {
            program,
            name: name.to_owned(),
            value,
        });
        Ok(())
    }

    fn submit_draw(&mut self, primitive: Primitive, count: usize) -> Result<(), BackendError> {
        let program = self.current_program.ok_or(BackendError::NotBound("program"))?;
        if primitive != Primitive::Points {
            let indices = match self.bound_indices.and_then(|b| self.buffers.get(&b)) {
                Some(Buffer::Index(indices)) => indices,
                _ => return Err(BackendError::NotBound("index buffer")),
            };
            if count > indices.len() {
                return Err(BackendError::NotBound("index range"));
            }
        }
        self.commands.push(Command::Draw {
            program,
            primitive,
            count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::shaders;
    use super::*;

    #[test]
    fn test_declared_names() {
        let attributes = declared_names(shaders::LIT_VERTEX_SRC, "attribute");
        assert_eq!(attributes.len(), 3);
        assert!(attributes.contains(shaders::ATTR_NORMAL));

        let uniforms = declared_names(shaders::LIT_FRAGMENT_SRC, "uniform");
        assert!(uniforms.contains(shaders::UNIFORM_SHININESS));
        assert!(uniforms.contains(shaders::UNIFORM_TORCH_FOV));
        assert!(!uniforms.contains(shaders::UNIFORM_MODEL));
    }

    #[test]
    fn test_checks_names_and_handles() {
        let mut backend = RecordingBackend::new();
        let program = backend
            .compile_program(shaders::UNLIT_VERTEX_SRC, shaders::UNLIT_FRAGMENT_SRC)
            .unwrap();
        let buffer = backend.allocate_buffer(BufferData::Attribute(&[0.0; 9])).unwrap();

        assert_eq!(
            backend.bind_attribute(program, shaders::ATTR_NORMAL, buffer, 3),
            Err(BackendError::MissingAttribute("aNormal".to_owned()))
        );
        assert_eq!(
            backend.set_uniform(program, shaders::UNIFORM_SHININESS, Uniform::Float(1.0)),
            Err(BackendError::MissingUniform("uShininess".to_owned()))
        );
        assert_eq!(
            backend.use_program(ProgramHandle(5)),
            Err(BackendError::UnknownProgram(ProgramHandle(5)))
        );

        backend.release_buffer(buffer).unwrap();
        assert_eq!(
            backend.release_buffer(buffer),
            Err(BackendError::UnknownBuffer(buffer))
        );
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_indexed_draw_needs_indices() {
        let mut backend = RecordingBackend::new();
        assert_eq!(
            backend.submit_draw(Primitive::Points, 3),
            Err(BackendError::NotBound("program"))
        );

        let program = backend
            .compile_program(shaders::UNLIT_VERTEX_SRC, shaders::UNLIT_FRAGMENT_SRC)
            .unwrap();
        backend.use_program(program).unwrap();
        backend.submit_draw(Primitive::Points, 3).unwrap();
        assert!(backend.submit_draw(Primitive::Triangles, 3).is_err());

        let indices = backend.allocate_buffer(BufferData::Index(&[0, 1, 2])).unwrap();
        backend.bind_indices(indices).unwrap();
        backend.submit_draw(Primitive::Triangles, 3).unwrap();
        assert!(backend.submit_draw(Primitive::Triangles, 6).is_err());
        assert_eq!(backend.draws().count(), 2);
    }

    #[test]
    fn test_fail_compilation() {
        let mut backend = RecordingBackend::new();
        backend.fail_compilation = true;
        assert!(matches!(
            backend.compile_program(shaders::LIT_VERTEX_SRC, shaders::LIT_FRAGMENT_SRC),
            Err(BackendError::Compile(_))
        ));
        assert_eq!(backend.program_count(), 0);
    }
}
