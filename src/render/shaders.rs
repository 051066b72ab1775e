// Names shared between the shader text and the renderer.
pub const ATTR_POSITION: &str = "aPosition";
pub const ATTR_COLOR: &str = "aColor";
pub const ATTR_NORMAL: &str = "aNormal";

pub const UNIFORM_MODEL: &str = "uModel";
pub const UNIFORM_VIEW: &str = "uView";
pub const UNIFORM_PROJECTION: &str = "uProjection";
pub const UNIFORM_NORMAL_MATRIX: &str = "uWorldInverseTranspose";
pub const UNIFORM_LIGHT_POSITION: &str = "uLightWorldPosition";
pub const UNIFORM_VIEW_POSITION: &str = "uViewWorldPosition";
pub const UNIFORM_SHININESS: &str = "uShininess";
pub const UNIFORM_AMBIENT: &str = "uAmbient";
pub const UNIFORM_CLAMP_DIFFUSE: &str = "uClampDiffuse";
pub const UNIFORM_TORCH_ENABLED: &str = "uTorchEnabled";
pub const UNIFORM_TORCH_DIRECTION: &str = "uTorchDirection";
pub const UNIFORM_TORCH_FOV: &str = "uTorchFov";

/// Vertex shader for bodies lit by the scene's light source.
pub static LIT_VERTEX_SRC: &str = "#version 100
    attribute vec3 aPosition;
    attribute vec3 aColor;
    attribute vec3 aNormal;

    uniform mat4 uModel;
    uniform mat4 uView;
    uniform mat4 uProjection;
    uniform mat4 uWorldInverseTranspose;
    uniform vec3 uLightWorldPosition;
    uniform vec3 uViewWorldPosition;

    varying vec3 vColor;
    varying vec3 vNormal;
    varying vec3 vSurfaceToLight;
    varying vec3 vSurfaceToView;

    void main() {
        gl_Position = uProjection * uView * uModel * vec4(aPosition, 1.0);
        vColor = aColor;
        vNormal = mat3(uWorldInverseTranspose) * aNormal;

        vec3 surfaceWorldPosition = (uModel * vec4(aPosition, 1.0)).xyz;
        vSurfaceToLight = uLightWorldPosition - surfaceWorldPosition;
        vSurfaceToView = uViewWorldPosition - surfaceWorldPosition;
    }";

/// Fragment shader for lit bodies. Keep in sync with `shading::shade`.
pub static LIT_FRAGMENT_SRC: &str = "#version 100
#ifdef GL_FRAGMENT_PRECISION_HIGH
   precision highp float;
#else
   precision mediump float;
#endif

    uniform float uShininess;
    uniform float uAmbient;
    uniform bool uClampDiffuse;
    uniform bool uTorchEnabled;
    uniform vec3 uTorchDirection;
    uniform float uTorchFov;

    varying vec3 vColor;
    varying vec3 vNormal;
    varying vec3 vSurfaceToLight;
    varying vec3 vSurfaceToView;

    void main() {
        vec3 normal = normalize(vNormal);
        vec3 surfaceToLightDirection = normalize(vSurfaceToLight);
        vec3 surfaceToViewDirection = normalize(vSurfaceToView);
        vec3 halfVector = normalize(surfaceToLightDirection + surfaceToViewDirection);

        vec3 ambient = uAmbient * vColor;

        float light = dot(normal, surfaceToLightDirection);
        float specular = 0.0;
        if (light > 0.0) {
            specular = pow(dot(normal, halfVector), uShininess);
        }
        if (uClampDiffuse) {
            light = max(light, 0.0);
        }

        if (uTorchEnabled) {
            float spot = dot(-surfaceToViewDirection, normalize(uTorchDirection));
            if (spot >= cos(0.5 * uTorchFov)) {
                light += max(dot(normal, surfaceToViewDirection), 0.0);
            }
        }

        gl_FragColor = vec4(vColor, 1.0);
        gl_FragColor.rgb *= (ambient + light);
        gl_FragColor.rgb += specular;
    }";

/// Vertex shader for light sources, which are drawn flat.
pub static UNLIT_VERTEX_SRC: &str = "#version 100
    attribute vec3 aPosition;
    attribute vec3 aColor;

    uniform mat4 uModel;
    uniform mat4 uView;
    uniform mat4 uProjection;

    varying vec3 vColor;

    void main() {
        gl_Position = uProjection * uView * uModel * vec4(aPosition, 1.0);
        vColor = aColor;
    }";

pub static UNLIT_FRAGMENT_SRC: &str = "#version 100
#ifdef GL_FRAGMENT_PRECISION_HIGH
   precision highp float;
#else
   precision mediump float;
#endif

    varying vec3 vColor;
    void main() {
        gl_FragColor = vec4(vColor, 1.0);
    }";
